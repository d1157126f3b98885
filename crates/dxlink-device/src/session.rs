use std::time::Duration;

use dxlink_frame::{instruction_name, InstructionWriter, StatusPacket, StatusReader};
use dxlink_transport::{ResourceGuard, SerialTransport};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::retry::RetryPolicy;

/// An open connection to one bus.
///
/// Owns the transport, a send buffer and a receive buffer, and the claim on
/// the bus resources. One exchange runs at a time; the bus is released when
/// the session is dropped.
pub struct Session<T: SerialTransport> {
    transport: T,
    writer: InstructionWriter,
    reader: StatusReader,
    config: SessionConfig,
    baud_rate: u32,
    _claim: ResourceGuard,
}

impl<T: SerialTransport> Session<T> {
    pub(crate) fn from_parts(
        transport: T,
        config: SessionConfig,
        baud_rate: u32,
        claim: ResourceGuard,
    ) -> Self {
        Self {
            transport,
            writer: InstructionWriter::with_capacity(config.buffer_size),
            reader: StatusReader::with_capacity(config.buffer_size),
            config,
            baud_rate,
            _claim: claim,
        }
    }

    /// Send one instruction and read its status packet. Never retries.
    pub fn exchange(
        &mut self,
        id: u8,
        instruction: u8,
        params: &[u8],
        wait: Duration,
    ) -> Result<StatusPacket> {
        self.writer
            .send(&mut self.transport, id, instruction, params)?;
        match self.reader.read_status(&mut self.transport, id, wait) {
            Ok(packet) => {
                debug!(
                    id,
                    instruction = instruction_name(instruction),
                    params = packet.params.len(),
                    "exchange succeeded"
                );
                Ok(packet)
            }
            Err(err) => {
                debug!(
                    id,
                    instruction = instruction_name(instruction),
                    error = %err,
                    "exchange failed"
                );
                Err(err.into())
            }
        }
    }

    /// Run `op` under `policy`, scaling the session wait.
    pub(crate) fn with_retry<R>(
        &mut self,
        policy: RetryPolicy,
        mut op: impl FnMut(&mut Self, Duration) -> Result<R>,
    ) -> Result<R> {
        let wait = policy.wait(self.config.wait);
        self.retry_with_wait(policy, wait, |session| op(session, wait))
    }

    /// Run `op` under `policy` with an explicit per-attempt wait.
    pub(crate) fn retry_with_wait<R>(
        &mut self,
        policy: RetryPolicy,
        wait: Duration,
        mut op: impl FnMut(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let attempts = policy.attempts(self.config.default_iterations);
        debug!(attempts, ?wait, "running with retry");
        policy.run(attempts, || op(self))
    }

    /// Change the transport's baud rate. Returns the rate actually applied.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<u32> {
        let actual = self.transport.set_baud_rate(baud_rate)?;
        info!(port = self.transport.name(), baud_rate = actual, "transport baud rate changed");
        self.baud_rate = actual;
        Ok(actual)
    }

    /// The transport's current baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Name of the underlying transport.
    pub fn name(&self) -> &str {
        self.transport.name()
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: SerialTransport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport.name())
            .field("baud_rate", &self.baud_rate)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use dxlink_frame::{FrameError, PING};
    use dxlink_transport::{ResourceRegistry, ScriptedTransport};

    use super::*;
    use crate::connector::open;
    use crate::error::{DeviceError, Outcome};

    const PING_RESPONSE: [u8; 14] = [
        0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x07, 0x00, 0x55, 0x00, 0x06, 0x04, 0x26, 0x65, 0x5D,
    ];

    #[test]
    fn exchange_writes_then_reads() {
        let registry = ResourceRegistry::new();
        let t = ScriptedTransport::new("bus0").reply(&PING_RESPONSE);
        let mut session = open(t, &registry).unwrap();

        let packet = session
            .exchange(1, PING, &[], Duration::from_micros(500))
            .unwrap();
        assert_eq!(packet.params.as_ref(), &[0x06, 0x04, 0x26]);
        assert_eq!(
            session.get_ref().sent(),
            &[vec![0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]]
        );
    }

    #[test]
    fn exchange_reports_outcome() {
        let registry = ResourceRegistry::new();
        let t = ScriptedTransport::new("bus0").silence();
        let mut session = open(t, &registry).unwrap();

        let err = session
            .exchange(1, PING, &[], Duration::from_micros(500))
            .unwrap_err();
        assert_eq!(err.outcome(), Outcome::NoResponse);
    }

    #[test]
    fn transport_failure_is_not_an_exchange_outcome() {
        let registry = ResourceRegistry::new();
        let t = ScriptedTransport::new("bus0").fail_sends(1);
        let mut session = open(t, &registry).unwrap();

        let err = session
            .exchange(1, PING, &[], Duration::from_micros(500))
            .unwrap_err();
        assert!(matches!(err, DeviceError::Frame(FrameError::Transport(_))));
        assert_eq!(err.outcome(), Outcome::TransportFault);
    }

    #[test]
    fn retry_scales_wait() {
        let registry = ResourceRegistry::new();
        let t = ScriptedTransport::new("bus0").silence_n(2);
        let mut session = open(t, &registry).unwrap();

        let result = session.with_retry(RetryPolicy::new(98, 2), |s, wait| {
            s.exchange(1, PING, &[], wait)
        });
        assert!(result.is_err());
        assert_eq!(
            session.get_ref().waits(),
            &[Duration::from_micros(500 * 98), Duration::from_micros(500 * 98)]
        );
    }

    #[test]
    fn set_baud_rate_updates_state() {
        let registry = ResourceRegistry::new();
        let mut session = open(ScriptedTransport::new("bus0"), &registry).unwrap();
        assert_eq!(session.baud_rate(), 57_600);
        session.set_baud_rate(1_000_000).unwrap();
        assert_eq!(session.baud_rate(), 1_000_000);
        assert_eq!(session.get_ref().baud_changes(), &[57_600, 1_000_000]);
    }
}
