use std::time::Duration;

use dxlink_transport::TransportError;

use crate::status::DeviceStatus;

/// Errors that can occur while framing or exchanging packets.
///
/// Apart from the encode and transport variants, each variant is one
/// terminal outcome of a status read.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A complete frame arrived but its checksum did not match, or its
    /// length field was too small to be a status packet.
    #[error("status packet checksum mismatch")]
    WrongChecksum,

    /// The device answered with a non-zero error byte.
    #[error("device {id} reported {status}")]
    StatusError { id: u8, status: DeviceStatus },

    /// A valid status packet arrived from a different device.
    #[error("status from id {actual}, expected id {expected}")]
    WrongId { expected: u8, actual: u8 },

    /// Bytes arrived but never formed a complete status packet.
    #[error("incomplete status packet")]
    IncompleteData,

    /// The receive buffer filled while more bytes were still pending.
    #[error("status packet exceeds receive buffer of {capacity} bytes")]
    OversizedData { capacity: usize },

    /// Nothing arrived within the wait bound.
    #[error("no response within {wait:?}")]
    NoResponse { wait: Duration },

    /// An encoded instruction does not fit the length field or send buffer.
    #[error("instruction too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The underlying transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
