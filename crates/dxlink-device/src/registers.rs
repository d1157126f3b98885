//! Control table layout and value encodings.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{DeviceError, Result};

/// A control table entry: where a quantity lives and how wide it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Register {
    pub name: &'static str,
    pub address: u16,
    pub width: usize,
}

impl Register {
    const fn new(name: &'static str, address: u16, width: usize) -> Self {
        Self {
            name,
            address,
            width,
        }
    }
}

pub const MODEL_NUMBER: Register = Register::new("model_number", 0, 2);
pub const FIRMWARE_VERSION: Register = Register::new("firmware_version", 6, 1);
pub const BAUD_RATE: Register = Register::new("baud_rate", 8, 1);
pub const RETURN_DELAY_TIME: Register = Register::new("return_delay_time", 9, 1);
pub const DRIVE_MODE: Register = Register::new("drive_mode", 10, 1);
pub const OPERATING_MODE: Register = Register::new("operating_mode", 11, 1);
pub const TORQUE_ENABLE: Register = Register::new("torque_enable", 64, 1);
pub const GOAL_CURRENT: Register = Register::new("goal_current", 102, 2);
pub const GOAL_VELOCITY: Register = Register::new("goal_velocity", 104, 4);
pub const GOAL_POSITION: Register = Register::new("goal_position", 116, 4);
pub const PRESENT_CURRENT: Register = Register::new("present_current", 126, 2);
pub const PRESENT_VELOCITY: Register = Register::new("present_velocity", 128, 4);
pub const PRESENT_POSITION: Register = Register::new("present_position", 132, 4);
pub const PRESENT_TEMPERATURE: Register = Register::new("present_temperature", 146, 1);

/// Every known register, in address order.
pub const ALL: [Register; 14] = [
    MODEL_NUMBER,
    FIRMWARE_VERSION,
    BAUD_RATE,
    RETURN_DELAY_TIME,
    DRIVE_MODE,
    OPERATING_MODE,
    TORQUE_ENABLE,
    GOAL_CURRENT,
    GOAL_VELOCITY,
    GOAL_POSITION,
    PRESENT_CURRENT,
    PRESENT_VELOCITY,
    PRESENT_POSITION,
    PRESENT_TEMPERATURE,
];

/// Look up a register by its snake_case name.
pub fn by_name(name: &str) -> Option<Register> {
    ALL.iter().copied().find(|r| r.name == name)
}

/// Degrees per position unit.
pub const POSITION_SCALE: f64 = 0.088;

/// Revolutions per minute per velocity unit.
pub const VELOCITY_SCALE: f64 = 0.229;

/// Milliamperes per current unit.
pub const CURRENT_SCALE: f64 = 1.0;

/// Convert a raw signed register value to physical units.
pub fn scale_from_raw(raw: i32, scale: f64) -> f64 {
    raw as f64 * scale
}

/// Convert a physical value to the nearest raw value that fits `width` bytes
/// in two's complement.
pub fn scale_to_raw(value: f64, scale: f64, width: usize) -> Result<i32> {
    let raw = (value / scale).round();
    let (min, max) = match width {
        1 => (i8::MIN as f64, i8::MAX as f64),
        2 => (i16::MIN as f64, i16::MAX as f64),
        _ => (i32::MIN as f64, i32::MAX as f64),
    };
    if !raw.is_finite() || raw < min || raw > max {
        return Err(DeviceError::InvalidValue(format!(
            "{value} is out of range for a {width}-byte register"
        )));
    }
    Ok(raw as i32)
}

/// Return delay register holds half the delay in microseconds.
pub fn return_delay_from_raw(raw: u8) -> u32 {
    u32::from(raw) * 2
}

/// Encode a return delay, rounding odd microsecond values up.
pub fn return_delay_to_raw(us: u32) -> Result<u8> {
    u8::try_from(us.div_ceil(2)).map_err(|_| {
        DeviceError::InvalidValue(format!("return delay {us} us exceeds 510 us"))
    })
}

/// Baud rates the device supports, in register code order. This is also the
/// order configure tries them in.
pub const CANDIDATE_BAUD_RATES: [u32; 7] = [
    9_600, 57_600, 115_200, 1_000_000, 2_000_000, 3_000_000, 4_000_000,
];

/// Register code for a baud rate.
pub fn baud_code(baud_rate: u32) -> Result<u8> {
    CANDIDATE_BAUD_RATES
        .iter()
        .position(|&b| b == baud_rate)
        .map(|code| code as u8)
        .ok_or(DeviceError::UnsupportedBaudRate(baud_rate))
}

/// Baud rate for a register code.
pub fn baud_from_code(code: u8) -> Option<u32> {
    CANDIDATE_BAUD_RATES.get(code as usize).copied()
}

/// Control loop the device runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    Current,
    Velocity,
    Position,
    ExtendedPosition,
    CurrentBasedPosition,
    Pwm,
}

impl OperatingMode {
    pub fn code(self) -> u8 {
        match self {
            Self::Current => 0,
            Self::Velocity => 1,
            Self::Position => 3,
            Self::ExtendedPosition => 4,
            Self::CurrentBasedPosition => 5,
            Self::Pwm => 16,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Current),
            1 => Some(Self::Velocity),
            3 => Some(Self::Position),
            4 => Some(Self::ExtendedPosition),
            5 => Some(Self::CurrentBasedPosition),
            16 => Some(Self::Pwm),
            _ => None,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Current => "current",
            Self::Velocity => "velocity",
            Self::Position => "position",
            Self::ExtendedPosition => "extended-position",
            Self::CurrentBasedPosition => "current-based-position",
            Self::Pwm => "pwm",
        })
    }
}

impl FromStr for OperatingMode {
    type Err = DeviceError;

    /// Accepts the display name (`extended-position`) or the register code.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code)
                .ok_or_else(|| DeviceError::InvalidValue(format!("unknown operating mode {code}")));
        }
        ALL_OPERATING_MODES
            .iter()
            .copied()
            .find(|mode| mode.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| DeviceError::InvalidValue(format!("unknown operating mode '{s}'")))
    }
}

const ALL_OPERATING_MODES: [OperatingMode; 6] = [
    OperatingMode::Current,
    OperatingMode::Velocity,
    OperatingMode::Position,
    OperatingMode::ExtendedPosition,
    OperatingMode::CurrentBasedPosition,
    OperatingMode::Pwm,
];

pub const DRIVE_MODE_REVERSE: u8 = 0b0000_0001;
pub const DRIVE_MODE_TIME_BASED_PROFILE: u8 = 0b0000_0100;
pub const DRIVE_MODE_TORQUE_ON_BY_GOAL_UPDATE: u8 = 0b0000_1000;
/// Every bit that has a meaning in the drive mode register.
pub const DRIVE_MODE_MASK: u8 =
    DRIVE_MODE_REVERSE | DRIVE_MODE_TIME_BASED_PROFILE | DRIVE_MODE_TORQUE_ON_BY_GOAL_UPDATE;

/// Drive mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DriveMode {
    pub reverse: bool,
    pub time_based_profile: bool,
    pub torque_on_by_goal_update: bool,
}

impl DriveMode {
    /// Decode the register byte. Bits without a flag are ignored.
    pub fn from_raw(raw: u8) -> Self {
        Self {
            reverse: raw & DRIVE_MODE_REVERSE != 0,
            time_based_profile: raw & DRIVE_MODE_TIME_BASED_PROFILE != 0,
            torque_on_by_goal_update: raw & DRIVE_MODE_TORQUE_ON_BY_GOAL_UPDATE != 0,
        }
    }

    /// Decode a user-supplied byte, rejecting bits that have no flag.
    pub fn try_from_raw(raw: u8) -> Result<Self> {
        let unknown = raw & !DRIVE_MODE_MASK;
        if unknown != 0 {
            return Err(DeviceError::InvalidValue(format!(
                "drive mode {raw:#04x} sets undefined bits {unknown:#04x}"
            )));
        }
        Ok(Self::from_raw(raw))
    }

    pub fn to_raw(self) -> u8 {
        let mut raw = 0;
        if self.reverse {
            raw |= DRIVE_MODE_REVERSE;
        }
        if self.time_based_profile {
            raw |= DRIVE_MODE_TIME_BASED_PROFILE;
        }
        if self.torque_on_by_goal_update {
            raw |= DRIVE_MODE_TORQUE_ON_BY_GOAL_UPDATE;
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operating_mode_parses_name_or_code() {
        assert_eq!(
            "extended-position".parse::<OperatingMode>().unwrap(),
            OperatingMode::ExtendedPosition
        );
        assert_eq!("16".parse::<OperatingMode>().unwrap(), OperatingMode::Pwm);
        assert!("2".parse::<OperatingMode>().is_err());
        assert!("turbo".parse::<OperatingMode>().is_err());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("goal_position"), Some(GOAL_POSITION));
        assert_eq!(by_name("present_temperature").map(|r| r.address), Some(146));
        assert_eq!(by_name("nope"), None);
    }

    #[test]
    fn addresses_are_sorted_and_disjoint() {
        for pair in ALL.windows(2) {
            assert!(pair[0].address as usize + pair[0].width <= pair[1].address as usize);
        }
    }

    #[test]
    fn position_scaling() {
        let degrees = scale_from_raw(0x0E5D, POSITION_SCALE);
        assert!((degrees - 323.576).abs() < 1e-9);
        assert_eq!(scale_to_raw(302.0, POSITION_SCALE, 4).unwrap(), 0x0D68);
    }

    #[test]
    fn velocity_and_current_scaling() {
        assert!((scale_from_raw(0x0E5D, VELOCITY_SCALE) - 842.033).abs() < 1e-9);
        assert_eq!(scale_to_raw(60.0, VELOCITY_SCALE, 4).unwrap(), 0x0106);
        assert_eq!(scale_to_raw(1001.0, CURRENT_SCALE, 2).unwrap(), 0x03E9);
        assert_eq!(scale_to_raw(-5.0, CURRENT_SCALE, 2).unwrap(), -5);
    }

    #[test]
    fn scaling_out_of_range() {
        assert!(scale_to_raw(40_000.0, CURRENT_SCALE, 2).is_err());
        assert!(scale_to_raw(f64::NAN, POSITION_SCALE, 4).is_err());
    }

    #[test]
    fn return_delay() {
        assert_eq!(return_delay_from_raw(0x32), 100);
        assert_eq!(return_delay_to_raw(253).unwrap(), 0x7F);
        assert_eq!(return_delay_to_raw(252).unwrap(), 0x7E);
        assert_eq!(return_delay_to_raw(510).unwrap(), 0xFF);
        assert!(return_delay_to_raw(511).is_err());
    }

    #[test]
    fn baud_codes() {
        assert_eq!(baud_code(9_600).unwrap(), 0);
        assert_eq!(baud_code(2_000_000).unwrap(), 4);
        assert!(matches!(
            baud_code(38_400),
            Err(DeviceError::UnsupportedBaudRate(38_400))
        ));
        assert_eq!(baud_from_code(3), Some(1_000_000));
        assert_eq!(baud_from_code(7), None);
    }

    #[test]
    fn operating_modes() {
        assert_eq!(OperatingMode::from_code(3), Some(OperatingMode::Position));
        assert_eq!(OperatingMode::Pwm.code(), 16);
        assert_eq!(OperatingMode::from_code(2), None);
        for code in 0..=16 {
            if let Some(mode) = OperatingMode::from_code(code) {
                assert_eq!(mode.code(), code);
            }
        }
    }

    #[test]
    fn drive_mode_bits() {
        let mode = DriveMode::from_raw(0b101);
        assert!(mode.reverse);
        assert!(mode.time_based_profile);
        assert!(!mode.torque_on_by_goal_update);

        let mode = DriveMode::from_raw(0b1001);
        assert!(mode.reverse);
        assert!(!mode.time_based_profile);
        assert!(mode.torque_on_by_goal_update);
        assert_eq!(mode.to_raw(), 0b1001);
    }

    #[test]
    fn drive_mode_undefined_bits_rejected() {
        assert_eq!(DriveMode::try_from_raw(0b1101).unwrap().to_raw(), 0b1101);
        assert_eq!(DriveMode::try_from_raw(0).unwrap(), DriveMode::default());
        for raw in [0b0010, 0b1_0000, 0xFF] {
            assert!(matches!(
                DriveMode::try_from_raw(raw),
                Err(DeviceError::InvalidValue(_))
            ));
        }
    }
}
