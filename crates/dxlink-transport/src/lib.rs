//! Serial transport abstraction for half-duplex servo buses.
//!
//! Provides:
//! - [`SerialTransport`], the byte-level surface every protocol layer uses
//! - [`SerialPortTransport`], a real serial port (feature `serial`)
//! - `ScriptedTransport`, an in-memory line for tests (feature `testing`)
//! - [`ResourceRegistry`], exclusive ownership of ports and control pins
//!
//! This is the lowest layer of dxlink. Everything else builds on top of
//! the [`SerialTransport`] trait provided here.

pub mod error;
pub mod registry;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod scripted;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use registry::{Resource, ResourceGuard, ResourceRegistry};
pub use traits::{DataBits, LineSettings, Parity, SerialTransport, StopBits, DEFAULT_BAUD_RATE};

#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedTransport;

#[cfg(feature = "serial")]
pub use serial::{available_ports, PortInfo, SerialPortTransport};
