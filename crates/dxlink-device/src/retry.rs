use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// How many times an operation is attempted and how long each attempt waits.
///
/// A zero in either field selects the session default: `iterations == 0`
/// means the session's default attempt count, `wait_multiplier == 0` means
/// the session's base wait unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub wait_multiplier: u32,
    pub iterations: u32,
}

impl RetryPolicy {
    /// One attempt at the base wait.
    pub const ONCE: Self = Self {
        wait_multiplier: 0,
        iterations: 1,
    };

    pub fn new(wait_multiplier: u32, iterations: u32) -> Self {
        Self {
            wait_multiplier,
            iterations,
        }
    }

    /// Number of attempts, given the session default.
    pub fn attempts(&self, default: u32) -> u32 {
        match self.iterations {
            0 => default.max(1),
            n => n,
        }
    }

    /// Wait per attempt, given the session's base wait.
    pub fn wait(&self, base: Duration) -> Duration {
        match self.wait_multiplier {
            0 => base,
            m => base.saturating_mul(m),
        }
    }

    /// Run `op` up to `attempts` times, stopping at the first success.
    ///
    /// The error of the last attempt is returned unchanged.
    pub fn run<R>(&self, attempts: u32, mut op: impl FnMut() -> Result<R>) -> Result<R> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => return Err(err),
                Err(err) => {
                    debug!(attempt, attempts, error = %err, "attempt failed, retrying");
                    attempt += 1;
                }
            }
        }
    }
}
