//! One method per protocol instruction.
//!
//! The plain methods run under a [`RetryPolicy`]; the `_once` variants
//! perform exactly one exchange at an explicit wait.

use std::time::Duration;

use bytes::Bytes;
use dxlink_frame::byte_pair::{combine_u16, split_u16};
use dxlink_frame::{
    FactoryResetMode, StatusPacket, ACTION, FACTORY_RESET, PING, READ, REBOOT, REG_WRITE, WRITE,
};
use dxlink_transport::SerialTransport;
use serde::Serialize;

use crate::error::{DeviceError, Result};
use crate::retry::RetryPolicy;
use crate::session::Session;

/// What a device reports in answer to a ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PingInfo {
    pub model_number: u16,
    pub firmware_version: u8,
}

impl<T: SerialTransport> Session<T> {
    /// Check that device `id` is present.
    pub fn ping(&mut self, id: u8, policy: RetryPolicy) -> Result<PingInfo> {
        self.with_retry(policy, |s, wait| s.ping_once(id, wait))
    }

    /// Ping exactly once.
    pub fn ping_once(&mut self, id: u8, wait: Duration) -> Result<PingInfo> {
        let packet = self.exchange(id, PING, &[], wait)?;
        let params = expect_len(&packet, 3)?;
        Ok(PingInfo {
            model_number: combine_u16(params[0], params[1]),
            firmware_version: params[2],
        })
    }

    /// Read `width` bytes starting at `address`.
    pub fn read(
        &mut self,
        id: u8,
        address: u16,
        width: usize,
        policy: RetryPolicy,
    ) -> Result<Bytes> {
        self.with_retry(policy, |s, wait| s.read_once(id, address, width, wait))
    }

    /// Read exactly once.
    ///
    /// A status whose parameter count differs from `width` is a
    /// [`DeviceError::WrongParameter`] even though it was well formed.
    pub fn read_once(
        &mut self,
        id: u8,
        address: u16,
        width: usize,
        wait: Duration,
    ) -> Result<Bytes> {
        let len = u16::try_from(width)
            .map_err(|_| DeviceError::InvalidValue(format!("read width {width} too large")))?;
        let mut params = [0u8; 4];
        params[..2].copy_from_slice(&split_u16(address));
        params[2..].copy_from_slice(&split_u16(len));
        let packet = self.exchange(id, READ, &params, wait)?;
        expect_len(&packet, width)?;
        Ok(packet.params)
    }

    /// Write `data` starting at `address`.
    pub fn write(&mut self, id: u8, address: u16, data: &[u8], policy: RetryPolicy) -> Result<()> {
        self.with_retry(policy, |s, wait| s.write_once(id, address, data, wait))
    }

    /// Write exactly once.
    pub fn write_once(&mut self, id: u8, address: u16, data: &[u8], wait: Duration) -> Result<()> {
        self.addressed(id, WRITE, address, data, wait)
    }

    /// Stage a write that takes effect on the next [`action`](Self::action).
    pub fn reg_write(
        &mut self,
        id: u8,
        address: u16,
        data: &[u8],
        policy: RetryPolicy,
    ) -> Result<()> {
        self.with_retry(policy, |s, wait| {
            s.addressed(id, REG_WRITE, address, data, wait)
        })
    }

    /// Apply a staged [`reg_write`](Self::reg_write).
    pub fn action(&mut self, id: u8, policy: RetryPolicy) -> Result<()> {
        self.with_retry(policy, |s, wait| s.exchange(id, ACTION, &[], wait).map(drop))
    }

    /// Restore factory defaults, keeping what `mode` says to keep.
    pub fn factory_reset(
        &mut self,
        id: u8,
        mode: FactoryResetMode,
        policy: RetryPolicy,
    ) -> Result<()> {
        self.with_retry(policy, |s, wait| {
            s.exchange(id, FACTORY_RESET, &[mode.code()], wait)
                .map(drop)
        })
    }

    /// Restart the device.
    pub fn reboot(&mut self, id: u8, policy: RetryPolicy) -> Result<()> {
        self.with_retry(policy, |s, wait| s.exchange(id, REBOOT, &[], wait).map(drop))
    }

    fn addressed(
        &mut self,
        id: u8,
        instruction: u8,
        address: u16,
        data: &[u8],
        wait: Duration,
    ) -> Result<()> {
        let mut params = Vec::with_capacity(2 + data.len());
        params.extend_from_slice(&split_u16(address));
        params.extend_from_slice(data);
        self.exchange(id, instruction, &params, wait)?;
        Ok(())
    }
}

fn expect_len(packet: &StatusPacket, expected: usize) -> Result<&[u8]> {
    if packet.params.len() != expected {
        return Err(DeviceError::WrongParameter {
            expected,
            actual: packet.params.len(),
        });
    }
    Ok(&packet.params)
}
