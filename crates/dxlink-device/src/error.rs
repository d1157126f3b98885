use std::fmt;

use dxlink_frame::FrameError;
use dxlink_transport::TransportError;
use serde::Serialize;

/// Errors that can occur in device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error, including every failed exchange outcome.
    #[error("{0}")]
    Frame(#[from] FrameError),

    /// A well-formed status carried the wrong number of parameter bytes.
    #[error("expected {expected} parameter bytes, got {actual}")]
    WrongParameter { expected: usize, actual: usize },

    /// The baud rate has no register code.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    /// A value cannot be encoded into its register.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A configure step failed; later steps were not attempted.
    #[error("configure step '{step}' failed: {source}")]
    Configure {
        step: ConfigureStep,
        #[source]
        source: Box<DeviceError>,
    },
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// One stage of [`Session::configure`](crate::Session::configure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigureStep {
    DiscoverBaudRate,
    DisableTorque,
    WriteBaudRate,
    SwitchTransportBaudRate,
    WriteReturnDelay,
    WriteOperatingMode,
}

impl fmt::Display for ConfigureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DiscoverBaudRate => "discover baud rate",
            Self::DisableTorque => "disable torque",
            Self::WriteBaudRate => "write baud rate",
            Self::SwitchTransportBaudRate => "switch transport baud rate",
            Self::WriteReturnDelay => "write return delay",
            Self::WriteOperatingMode => "write operating mode",
        })
    }
}

/// Discriminated result of a device operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    WrongChecksum,
    StatusError,
    WrongId,
    IncompleteData,
    OversizedData,
    NoResponse,
    WrongParameter,
    TransportFault,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::WrongChecksum => "wrong checksum",
            Self::StatusError => "status error",
            Self::WrongId => "wrong id",
            Self::IncompleteData => "incomplete data",
            Self::OversizedData => "oversized data",
            Self::NoResponse => "no response",
            Self::WrongParameter => "wrong parameter",
            Self::TransportFault => "transport fault",
        })
    }
}

impl DeviceError {
    /// Classify this error as an exchange outcome.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Frame(err) => match err {
                FrameError::WrongChecksum => Outcome::WrongChecksum,
                FrameError::StatusError { .. } => Outcome::StatusError,
                FrameError::WrongId { .. } => Outcome::WrongId,
                FrameError::IncompleteData => Outcome::IncompleteData,
                FrameError::OversizedData { .. } => Outcome::OversizedData,
                FrameError::NoResponse { .. } => Outcome::NoResponse,
                FrameError::PayloadTooLarge { .. } => Outcome::WrongParameter,
                FrameError::Transport(_) => Outcome::TransportFault,
            },
            Self::Transport(_) => Outcome::TransportFault,
            Self::WrongParameter { .. }
            | Self::UnsupportedBaudRate(_)
            | Self::InvalidValue(_) => Outcome::WrongParameter,
            Self::Configure { source, .. } => source.outcome(),
        }
    }

    /// The device's raw error byte, for status errors.
    pub fn status_byte(&self) -> Option<u8> {
        match self {
            Self::Frame(FrameError::StatusError { status, .. }) => Some(status.raw()),
            Self::Configure { source, .. } => source.status_byte(),
            _ => None,
        }
    }

    pub(crate) fn in_step(self, step: ConfigureStep) -> Self {
        Self::Configure {
            step,
            source: Box::new(self),
        }
    }
}
