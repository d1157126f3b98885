//! Driver for half-duplex servo buses speaking protocol 2.0.
//!
//! dxlink talks to DYNAMIXEL-style servos over a serial line: it frames and
//! checksums instruction packets, reads status packets back byte by byte,
//! retries failed exchanges, and exposes the control table as typed values.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-level serial transport, line settings, resource registry
//! - [`frame`]: packet codec, byte stuffing, CRC-16 and the status reader
//! - [`device`]: sessions, retry policy, instructions and register accessors
//!   (behind the `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use dxlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dxlink_frame::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use dxlink_device::*;
}
