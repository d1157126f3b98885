use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Default line rate for a factory-fresh device.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    Seven,
    #[default]
    Eight,
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// UART line format.
///
/// The device family speaks 8N1; only the baud rate normally changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl LineSettings {
    /// 8N1 at the given baud rate.
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            stop_bits: StopBits::default(),
            parity: Parity::default(),
        }
    }
}

impl fmt::Display for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{} {bits}{parity}{stop}", self.baud_rate)
    }
}

/// A half-duplex, byte-oriented serial channel.
///
/// This is the only surface the protocol layers depend on. Reads are strictly
/// one byte at a time and never block: callers poll availability first, with
/// [`byte_ready_within`](SerialTransport::byte_ready_within) being the only
/// place a bounded wait happens.
pub trait SerialTransport {
    /// Apply a full line configuration. Returns the baud rate actually set.
    fn configure(&mut self, settings: &LineSettings) -> Result<u32>;

    /// Change only the baud rate. Returns the baud rate actually set.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<u32>;

    /// Write every byte to the line (blocking).
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// True if at least one byte can be read right now.
    fn byte_ready_now(&mut self) -> bool;

    /// True if a byte is, or becomes, readable before `timeout` elapses.
    fn byte_ready_within(&mut self, timeout: Duration) -> bool;

    /// Read a single byte if one is immediately available.
    fn read_one(&mut self) -> Option<u8>;

    /// Stable name identifying the underlying device (e.g. `/dev/ttyUSB0`).
    fn name(&self) -> &str;
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn configure(&mut self, settings: &LineSettings) -> Result<u32> {
        (**self).configure(settings)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<u32> {
        (**self).set_baud_rate(baud_rate)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn byte_ready_now(&mut self) -> bool {
        (**self).byte_ready_now()
    }

    fn byte_ready_within(&mut self, timeout: Duration) -> bool {
        (**self).byte_ready_within(timeout)
    }

    fn read_one(&mut self) -> Option<u8> {
        (**self).read_one()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for &mut T {
    fn configure(&mut self, settings: &LineSettings) -> Result<u32> {
        (**self).configure(settings)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<u32> {
        (**self).set_baud_rate(baud_rate)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn byte_ready_now(&mut self) -> bool {
        (**self).byte_ready_now()
    }

    fn byte_ready_within(&mut self, timeout: Duration) -> bool {
        (**self).byte_ready_within(timeout)
    }

    fn read_one(&mut self) -> Option<u8> {
        (**self).read_one()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
