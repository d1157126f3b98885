use crate::registry::Resource;

/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named serial device.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial backend rejected a line configuration or control request.
    #[error("serial port error: {0}")]
    Serial(String),

    /// The transport or one of its signal lines is already claimed by
    /// another session.
    #[error("{0} is already in use by another session")]
    ResourceInUse(Resource),

    /// A resource description is out of range for the registry.
    #[error("invalid resource: {0}")]
    InvalidResource(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
