use std::time::Duration;

use dxlink_frame::DEFAULT_BUFFER_SIZE;
use dxlink_transport::LineSettings;

use crate::registers::OperatingMode;

/// Default wait for the first byte of a status packet.
pub const DEFAULT_WAIT: Duration = Duration::from_micros(500);

/// Default wait used by configure when the caller does not scale it.
pub const DEFAULT_CONFIGURE_WAIT: Duration = Duration::from_millis(100);

/// Attempts per operation when the caller asks for the default.
pub const DEFAULT_ITERATIONS: u32 = 5;

/// Configuration for a device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Line format applied when the session opens.
    pub line: LineSettings,
    /// Receive and send buffer size in bytes. Raised to 20 if smaller.
    pub buffer_size: usize,
    /// Base wait for a status packet; scaled by each call's multiplier.
    pub wait: Duration,
    /// Base wait for configure, whose discovery pings cross slow baud rates.
    pub configure_wait: Duration,
    /// Attempts used when a call's iteration count is 0.
    pub default_iterations: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            line: LineSettings::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            wait: DEFAULT_WAIT,
            configure_wait: DEFAULT_CONFIGURE_WAIT,
            default_iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// What [`Session::configure`](crate::Session::configure) writes once the
/// device is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Baud rate the device and transport end up on.
    pub baud_rate: u32,
    /// Return delay time in microseconds.
    pub return_delay_us: u32,
    pub operating_mode: OperatingMode,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            baud_rate: 1_000_000,
            return_delay_us: 0,
            operating_mode: OperatingMode::Position,
        }
    }
}
