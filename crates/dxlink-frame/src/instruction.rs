//! Instruction codes.
//!
//! Codes are fixed by the device protocol. Synchronized and bulk
//! multi-device instructions are not supported.

/// Check that a device is present; it answers with model and firmware.
pub const PING: u8 = 0x01;

/// Read a register range.
pub const READ: u8 = 0x02;

/// Write a register range.
pub const WRITE: u8 = 0x03;

/// Stage a write to be applied by a later [`ACTION`].
pub const REG_WRITE: u8 = 0x04;

/// Apply a staged [`REG_WRITE`].
pub const ACTION: u8 = 0x05;

/// Restore the control table to factory defaults.
pub const FACTORY_RESET: u8 = 0x06;

/// Restart the device.
pub const REBOOT: u8 = 0x08;

/// Marker carried in every status (response) packet.
pub const STATUS: u8 = 0x55;

/// Identifier addressing every device on the bus. No status is matched
/// against it.
pub const BROADCAST_ID: u8 = 0xFE;

/// Returns a human-readable name for an instruction code.
pub fn instruction_name(code: u8) -> &'static str {
    match code {
        PING => "PING",
        READ => "READ",
        WRITE => "WRITE",
        REG_WRITE => "REG_WRITE",
        ACTION => "ACTION",
        FACTORY_RESET => "FACTORY_RESET",
        REBOOT => "REBOOT",
        STATUS => "STATUS",
        _ => "UNKNOWN",
    }
}

/// What a factory reset keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryResetMode {
    /// Reset every value, including ID and baud rate.
    All,
    /// Reset everything except the ID.
    ExceptId,
    /// Reset everything except the ID and baud rate.
    ExceptIdAndBaudRate,
}

impl FactoryResetMode {
    /// Parameter byte sent with the instruction.
    pub fn code(self) -> u8 {
        match self {
            Self::All => 0xFF,
            Self::ExceptId => 0x01,
            Self::ExceptIdAndBaudRate => 0x02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(instruction_name(PING), "PING");
        assert_eq!(instruction_name(STATUS), "STATUS");
        assert_eq!(instruction_name(0x82), "UNKNOWN");
    }

    #[test]
    fn test_factory_reset_codes() {
        assert_eq!(FactoryResetMode::All.code(), 0xFF);
        assert_eq!(FactoryResetMode::ExceptId.code(), 0x01);
        assert_eq!(FactoryResetMode::ExceptIdAndBaudRate.code(), 0x02);
    }
}
