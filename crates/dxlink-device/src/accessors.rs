//! Typed register access in physical units.

use dxlink_frame::byte_pair::{combine, sign_extend, split};
use dxlink_transport::SerialTransport;

use crate::error::{DeviceError, Result};
use crate::registers::{
    baud_code, baud_from_code, return_delay_from_raw, return_delay_to_raw, scale_from_raw,
    scale_to_raw, DriveMode, OperatingMode, Register, BAUD_RATE, CURRENT_SCALE, DRIVE_MODE,
    FIRMWARE_VERSION, GOAL_CURRENT, GOAL_POSITION, GOAL_VELOCITY, MODEL_NUMBER, OPERATING_MODE,
    POSITION_SCALE, PRESENT_CURRENT, PRESENT_POSITION, PRESENT_TEMPERATURE, PRESENT_VELOCITY,
    RETURN_DELAY_TIME, TORQUE_ENABLE, VELOCITY_SCALE,
};
use crate::retry::RetryPolicy;
use crate::session::Session;

impl<T: SerialTransport> Session<T> {
    /// Read a register as an unsigned value.
    pub fn read_register(&mut self, id: u8, reg: Register, policy: RetryPolicy) -> Result<u32> {
        let data = self.read(id, reg.address, reg.width, policy)?;
        Ok(combine(&data))
    }

    /// Read a register as a two's-complement value of its width.
    pub fn read_register_signed(
        &mut self,
        id: u8,
        reg: Register,
        policy: RetryPolicy,
    ) -> Result<i32> {
        let raw = self.read_register(id, reg, policy)?;
        Ok(sign_extend(raw, reg.width))
    }

    /// Write the low `reg.width` bytes of `value`.
    pub fn write_register(
        &mut self,
        id: u8,
        reg: Register,
        value: u32,
        policy: RetryPolicy,
    ) -> Result<()> {
        self.write(id, reg.address, &split(value, reg.width), policy)
    }

    pub fn model_number(&mut self, id: u8, policy: RetryPolicy) -> Result<u16> {
        Ok(self.read_register(id, MODEL_NUMBER, policy)? as u16)
    }

    pub fn firmware_version(&mut self, id: u8, policy: RetryPolicy) -> Result<u8> {
        Ok(self.read_register(id, FIRMWARE_VERSION, policy)? as u8)
    }

    pub fn torque_enabled(&mut self, id: u8, policy: RetryPolicy) -> Result<bool> {
        Ok(self.read_register(id, TORQUE_ENABLE, policy)? != 0)
    }

    pub fn set_torque_enabled(&mut self, id: u8, enabled: bool, policy: RetryPolicy) -> Result<()> {
        self.write_register(id, TORQUE_ENABLE, u32::from(enabled), policy)
    }

    /// Present position in degrees.
    pub fn present_position(&mut self, id: u8, policy: RetryPolicy) -> Result<f64> {
        self.read_scaled(id, PRESENT_POSITION, POSITION_SCALE, policy)
    }

    /// Goal position in degrees.
    pub fn goal_position(&mut self, id: u8, policy: RetryPolicy) -> Result<f64> {
        self.read_scaled(id, GOAL_POSITION, POSITION_SCALE, policy)
    }

    pub fn set_goal_position(&mut self, id: u8, degrees: f64, policy: RetryPolicy) -> Result<()> {
        self.write_scaled(id, GOAL_POSITION, POSITION_SCALE, degrees, policy)
    }

    /// Present velocity in rpm.
    pub fn present_velocity(&mut self, id: u8, policy: RetryPolicy) -> Result<f64> {
        self.read_scaled(id, PRESENT_VELOCITY, VELOCITY_SCALE, policy)
    }

    /// Goal velocity in rpm.
    pub fn goal_velocity(&mut self, id: u8, policy: RetryPolicy) -> Result<f64> {
        self.read_scaled(id, GOAL_VELOCITY, VELOCITY_SCALE, policy)
    }

    pub fn set_goal_velocity(&mut self, id: u8, rpm: f64, policy: RetryPolicy) -> Result<()> {
        self.write_scaled(id, GOAL_VELOCITY, VELOCITY_SCALE, rpm, policy)
    }

    /// Present current in mA.
    pub fn present_current(&mut self, id: u8, policy: RetryPolicy) -> Result<f64> {
        self.read_scaled(id, PRESENT_CURRENT, CURRENT_SCALE, policy)
    }

    /// Goal current in mA.
    pub fn goal_current(&mut self, id: u8, policy: RetryPolicy) -> Result<f64> {
        self.read_scaled(id, GOAL_CURRENT, CURRENT_SCALE, policy)
    }

    pub fn set_goal_current(&mut self, id: u8, milliamps: f64, policy: RetryPolicy) -> Result<()> {
        self.write_scaled(id, GOAL_CURRENT, CURRENT_SCALE, milliamps, policy)
    }

    /// Present temperature in degrees Celsius.
    pub fn present_temperature(&mut self, id: u8, policy: RetryPolicy) -> Result<u8> {
        Ok(self.read_register(id, PRESENT_TEMPERATURE, policy)? as u8)
    }

    /// Return delay time in microseconds.
    pub fn return_delay_time(&mut self, id: u8, policy: RetryPolicy) -> Result<u32> {
        let raw = self.read_register(id, RETURN_DELAY_TIME, policy)?;
        Ok(return_delay_from_raw(raw as u8))
    }

    /// Set the return delay time. Odd values round up to the next 2 us step.
    pub fn set_return_delay_time(&mut self, id: u8, us: u32, policy: RetryPolicy) -> Result<()> {
        let raw = return_delay_to_raw(us)?;
        self.write_register(id, RETURN_DELAY_TIME, u32::from(raw), policy)
    }

    pub fn drive_mode(&mut self, id: u8, policy: RetryPolicy) -> Result<DriveMode> {
        let raw = self.read_register(id, DRIVE_MODE, policy)?;
        Ok(DriveMode::from_raw(raw as u8))
    }

    pub fn set_drive_mode(&mut self, id: u8, mode: DriveMode, policy: RetryPolicy) -> Result<()> {
        self.write_register(id, DRIVE_MODE, u32::from(mode.to_raw()), policy)
    }

    pub fn operating_mode(&mut self, id: u8, policy: RetryPolicy) -> Result<OperatingMode> {
        let code = self.read_register(id, OPERATING_MODE, policy)? as u8;
        OperatingMode::from_code(code)
            .ok_or_else(|| DeviceError::InvalidValue(format!("unknown operating mode {code}")))
    }

    pub fn set_operating_mode(
        &mut self,
        id: u8,
        mode: OperatingMode,
        policy: RetryPolicy,
    ) -> Result<()> {
        self.write_register(id, OPERATING_MODE, u32::from(mode.code()), policy)
    }

    /// Baud rate stored in the device (not the transport's).
    pub fn device_baud_rate(&mut self, id: u8, policy: RetryPolicy) -> Result<u32> {
        let code = self.read_register(id, BAUD_RATE, policy)? as u8;
        baud_from_code(code)
            .ok_or_else(|| DeviceError::InvalidValue(format!("unknown baud rate code {code}")))
    }

    /// Store a new baud rate in the device. The transport is not changed.
    pub fn set_device_baud_rate(
        &mut self,
        id: u8,
        baud_rate: u32,
        policy: RetryPolicy,
    ) -> Result<()> {
        let code = baud_code(baud_rate)?;
        self.write_register(id, BAUD_RATE, u32::from(code), policy)
    }

    fn read_scaled(
        &mut self,
        id: u8,
        reg: Register,
        scale: f64,
        policy: RetryPolicy,
    ) -> Result<f64> {
        let raw = self.read_register_signed(id, reg, policy)?;
        Ok(scale_from_raw(raw, scale))
    }

    fn write_scaled(
        &mut self,
        id: u8,
        reg: Register,
        scale: f64,
        value: f64,
        policy: RetryPolicy,
    ) -> Result<()> {
        let raw = scale_to_raw(value, scale, reg.width)?;
        self.write_register(id, reg, raw as u32, policy)
    }
}

#[cfg(test)]
mod tests {
    use dxlink_transport::{ResourceRegistry, ScriptedTransport};

    use super::*;
    use crate::connector::open;

    const WRITE_ACK: [u8; 11] = [
        0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x04, 0x00, 0x55, 0x00, 0xA1, 0x0C,
    ];

    fn session_replying(reply: &[u8]) -> Session<ScriptedTransport> {
        open(
            ScriptedTransport::new("bus").reply(reply),
            &ResourceRegistry::new(),
        )
        .unwrap()
    }

    fn one_byte_reply(value: u8, crc: [u8; 2]) -> Vec<u8> {
        vec![
            0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x05, 0x00, 0x55, 0x00, value, crc[0], crc[1],
        ]
    }

    // Parameter bytes of the single frame written so far: address then data.
    fn written(s: &Session<ScriptedTransport>) -> Vec<u8> {
        let frame = &s.get_ref().sent()[0];
        frame[8..frame.len() - 2].to_vec()
    }

    #[test]
    fn present_position_in_degrees() {
        let reply = [
            0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x08, 0x00, 0x55, 0x00, 0x5D, 0x0E, 0x00, 0x00, 0x7C,
            0x9C,
        ];
        let mut s = session_replying(&reply);
        let degrees = s.present_position(1, RetryPolicy::default()).unwrap();
        assert!((degrees - 323.576).abs() < 1e-9);
    }

    #[test]
    fn present_velocity_in_rpm() {
        let reply = [
            0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x08, 0x00, 0x55, 0x00, 0x5D, 0x0E, 0x00, 0x00, 0x7C,
            0x9C,
        ];
        let mut s = session_replying(&reply);
        let rpm = s.present_velocity(1, RetryPolicy::default()).unwrap();
        assert!((rpm - 842.033).abs() < 1e-9);
    }

    #[test]
    fn present_current_two_bytes() {
        let reply = [
            0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x06, 0x00, 0x55, 0x00, 0x5D, 0x00, 0xC0, 0x15,
        ];
        let mut s = session_replying(&reply);
        assert_eq!(s.present_current(1, RetryPolicy::default()).unwrap(), 93.0);
        assert_eq!(&s.get_ref().sent()[0][8..12], &[126, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn torque_enable_read() {
        let mut s = session_replying(&one_byte_reply(0x01, [0x56, 0xA1]));
        assert!(s.torque_enabled(1, RetryPolicy::default()).unwrap());
    }

    #[test]
    fn temperature_and_return_delay() {
        let mut s = session_replying(&one_byte_reply(0x32, [0xFC, 0xA1]));
        assert_eq!(s.present_temperature(1, RetryPolicy::default()).unwrap(), 0x32);

        let mut s = session_replying(&one_byte_reply(0x32, [0xFC, 0xA1]));
        assert_eq!(s.return_delay_time(1, RetryPolicy::default()).unwrap(), 100);
    }

    #[test]
    fn drive_mode_flags() {
        let mut s = session_replying(&one_byte_reply(0b101, [0x4D, 0x21]));
        let mode = s.drive_mode(1, RetryPolicy::default()).unwrap();
        assert!(mode.reverse && mode.time_based_profile && !mode.torque_on_by_goal_update);

        let mut s = session_replying(&one_byte_reply(0b1001, [0x65, 0x21]));
        let mode = s.drive_mode(1, RetryPolicy::default()).unwrap();
        assert!(mode.reverse && !mode.time_based_profile && mode.torque_on_by_goal_update);
    }

    #[test]
    fn operating_mode_and_baud_rate() {
        let mut s = session_replying(&one_byte_reply(3, [0x59, 0x21]));
        assert_eq!(
            s.operating_mode(1, RetryPolicy::default()).unwrap(),
            OperatingMode::Position
        );

        let mut s = session_replying(&one_byte_reply(4, [0x48, 0xA1]));
        assert_eq!(
            s.device_baud_rate(1, RetryPolicy::default()).unwrap(),
            2_000_000
        );
    }

    #[test]
    fn set_goal_position_rounds_to_nearest() {
        let mut s = session_replying(&WRITE_ACK);
        s.set_goal_position(1, 302.0, RetryPolicy::default()).unwrap();
        assert_eq!(written(&s), vec![116, 0x00, 0x68, 0x0D, 0x00, 0x00]);
    }

    #[test]
    fn set_goal_velocity_and_current() {
        let mut s = session_replying(&WRITE_ACK);
        s.set_goal_velocity(1, 60.0, RetryPolicy::default()).unwrap();
        assert_eq!(written(&s), vec![104, 0x00, 0x06, 0x01, 0x00, 0x00]);

        let mut s = session_replying(&WRITE_ACK);
        s.set_goal_current(1, 1001.0, RetryPolicy::default()).unwrap();
        assert_eq!(written(&s), vec![102, 0x00, 0xE9, 0x03]);
    }

    #[test]
    fn negative_goal_velocity_is_twos_complement() {
        let mut s = session_replying(&WRITE_ACK);
        s.set_goal_velocity(1, -0.229, RetryPolicy::default())
            .unwrap();
        assert_eq!(written(&s), vec![104, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn set_return_delay_rounds_up() {
        let mut s = session_replying(&WRITE_ACK);
        s.set_return_delay_time(1, 253, RetryPolicy::default())
            .unwrap();
        assert_eq!(written(&s), vec![9, 0x00, 0x7F]);
    }

    #[test]
    fn set_drive_mode_and_torque() {
        let mut s = session_replying(&WRITE_ACK);
        let mode = DriveMode {
            reverse: true,
            time_based_profile: false,
            torque_on_by_goal_update: true,
        };
        s.set_drive_mode(1, mode, RetryPolicy::default()).unwrap();
        assert_eq!(written(&s), vec![10, 0x00, 0b1001]);

        let mut s = session_replying(&WRITE_ACK);
        s.set_torque_enabled(1, true, RetryPolicy::default())
            .unwrap();
        assert_eq!(written(&s), vec![64, 0x00, 0x01]);
    }

    #[test]
    fn invalid_values_never_reach_the_bus() {
        let mut s = session_replying(&WRITE_ACK);
        assert!(s
            .set_device_baud_rate(1, 12_345, RetryPolicy::default())
            .is_err());
        assert!(s
            .set_goal_current(1, 1.0e6, RetryPolicy::default())
            .is_err());
        assert!(s.get_ref().sent().is_empty());
    }
}
