//! Device sessions for half-duplex servo buses.
//!
//! This is the "just works" layer. Open a [`Session`] on a transport, then
//! ping, read and write devices by ID. Every call runs under a
//! [`RetryPolicy`] and reports failures as a [`DeviceError`] whose
//! [`Outcome`] says what went wrong on the wire.

pub mod accessors;
pub mod config;
pub mod configure;
pub mod connector;
pub mod error;
pub mod instructions;
pub mod registers;
pub mod retry;
pub mod session;

#[cfg(feature = "serial")]
pub use connector::open_port;
pub use connector::{open, open_with_config};
pub use config::{
    DeviceSettings, SessionConfig, DEFAULT_CONFIGURE_WAIT, DEFAULT_ITERATIONS, DEFAULT_WAIT,
};
pub use configure::ConfigureReport;
pub use error::{ConfigureStep, DeviceError, Outcome, Result};
pub use instructions::PingInfo;
pub use registers::{DriveMode, OperatingMode, Register};
pub use retry::RetryPolicy;
pub use session::Session;
