use std::fmt;
use std::io;

use dxlink_device::DeviceError;
use dxlink_frame::FrameError;
use dxlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const DEVICE_ERROR: i32 = 70;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::ResourceInUse(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::NoResponse { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::StatusError { .. } => {
            CliError::new(DEVICE_ERROR, format!("{context}: {err}"))
        }
        FrameError::WrongChecksum
        | FrameError::WrongId { .. }
        | FrameError::IncompleteData
        | FrameError::OversizedData { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::PayloadTooLarge { .. } => CliError::usage(format!("{context}: {err}")),
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Transport(err) => transport_error(context, err),
        DeviceError::Frame(err) => frame_error(context, err),
        DeviceError::WrongParameter { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        DeviceError::UnsupportedBaudRate(_) | DeviceError::InvalidValue(_) => {
            CliError::usage(format!("{context}: {err}"))
        }
        DeviceError::Configure { step, source } => {
            device_error(&format!("{context} ({step})"), *source)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dxlink_device::ConfigureStep;
    use dxlink_frame::DeviceStatus;

    use super::*;

    #[test]
    fn exchange_outcomes_map_to_codes() {
        let cases = [
            (FrameError::WrongChecksum, DATA_INVALID),
            (
                FrameError::NoResponse {
                    wait: Duration::from_micros(500),
                },
                TIMEOUT,
            ),
            (
                FrameError::StatusError {
                    id: 1,
                    status: DeviceStatus(0x02),
                },
                DEVICE_ERROR,
            ),
            (FrameError::IncompleteData, DATA_INVALID),
        ];
        for (err, code) in cases {
            assert_eq!(device_error("ping", err.into()).code, code);
        }
    }

    #[test]
    fn missing_port_is_transport_error() {
        let err = DeviceError::Transport(TransportError::Open {
            port: "/dev/none".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        let cli = device_error("open failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("/dev/none"));
    }

    #[test]
    fn configure_failure_names_step() {
        let err = DeviceError::Configure {
            step: ConfigureStep::WriteBaudRate,
            source: Box::new(DeviceError::Frame(FrameError::NoResponse {
                wait: Duration::from_millis(100),
            })),
        };
        let cli = device_error("configure failed", err);
        assert_eq!(cli.code, TIMEOUT);
        assert!(cli.message.starts_with("configure failed (write baud rate)"));
    }

    #[test]
    fn claimed_port_is_plain_failure() {
        let err = TransportError::ResourceInUse(dxlink_transport::Resource::Pin(4));
        assert_eq!(transport_error("open failed", err).code, FAILURE);
    }

    #[test]
    fn bad_values_are_usage_errors() {
        let cli = device_error("set failed", DeviceError::UnsupportedBaudRate(12));
        assert_eq!(cli.code, USAGE);
    }
}
