use std::fmt;

/// Hardware alert flag in the status byte.
pub const ALERT_BIT: u8 = 0x80;

/// Error number reported in the low seven bits of a status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusErrorKind {
    ResultFail,
    InstructionError,
    CrcError,
    DataRange,
    DataLength,
    DataLimit,
    AccessError,
    Other(u8),
}

impl StatusErrorKind {
    fn from_number(n: u8) -> Self {
        match n {
            1 => Self::ResultFail,
            2 => Self::InstructionError,
            3 => Self::CrcError,
            4 => Self::DataRange,
            5 => Self::DataLength,
            6 => Self::DataLimit,
            7 => Self::AccessError,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for StatusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResultFail => f.write_str("result fail"),
            Self::InstructionError => f.write_str("instruction error"),
            Self::CrcError => f.write_str("crc error"),
            Self::DataRange => f.write_str("data range error"),
            Self::DataLength => f.write_str("data length error"),
            Self::DataLimit => f.write_str("data limit error"),
            Self::AccessError => f.write_str("access error"),
            Self::Other(n) => write!(f, "error {n}"),
        }
    }
}

/// The error byte of a status packet.
///
/// Zero means the device executed the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus(pub u8);

impl DeviceStatus {
    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// True when the device flags a hardware fault (overheating, overload...).
    pub fn alert(self) -> bool {
        self.0 & ALERT_BIT != 0
    }

    /// The error number, if any.
    pub fn error(self) -> Option<StatusErrorKind> {
        match self.0 & !ALERT_BIT {
            0 => None,
            n => Some(StatusErrorKind::from_number(n)),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.error(), self.alert()) {
            (None, false) => f.write_str("ok"),
            (None, true) => f.write_str("hardware alert"),
            (Some(kind), false) => write!(f, "{kind}"),
            (Some(kind), true) => write!(f, "{kind} (hardware alert)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok() {
        let s = DeviceStatus(0);
        assert!(s.is_ok());
        assert!(!s.alert());
        assert_eq!(s.error(), None);
        assert_eq!(s.to_string(), "ok");
    }

    #[test]
    fn test_error_numbers() {
        assert_eq!(DeviceStatus(0x04).error(), Some(StatusErrorKind::DataRange));
        assert_eq!(DeviceStatus(0x07).error(), Some(StatusErrorKind::AccessError));
        assert_eq!(DeviceStatus(0x09).error(), Some(StatusErrorKind::Other(9)));
    }

    #[test]
    fn test_alert_flag() {
        let s = DeviceStatus(0x82);
        assert!(s.alert());
        assert!(!s.is_ok());
        assert_eq!(s.error(), Some(StatusErrorKind::InstructionError));
        assert_eq!(s.to_string(), "instruction error (hardware alert)");
        assert_eq!(DeviceStatus(0x80).to_string(), "hardware alert");
    }
}
