use std::io::{Read, Write};
use std::time::{Duration, Instant};

use serialport::SerialPort;
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{DataBits, LineSettings, Parity, SerialTransport, StopBits};

/// Sleep between availability polls while waiting for a byte.
const POLL_INTERVAL: Duration = Duration::from_micros(50);

/// Read timeout handed to the OS driver. Reads only happen after
/// `bytes_to_read` reported data, so this only bounds pathological cases.
const DRIVER_TIMEOUT: Duration = Duration::from_millis(10);

/// A physical serial port driven through the `serialport` crate.
pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialPortTransport {
    /// Open `path` with the given line settings.
    pub fn open(path: &str, settings: &LineSettings) -> Result<Self> {
        let port = serialport::new(path, settings.baud_rate)
            .data_bits(data_bits(settings.data_bits))
            .stop_bits(stop_bits(settings.stop_bits))
            .parity(parity(settings.parity))
            .flow_control(serialport::FlowControl::None)
            .timeout(DRIVER_TIMEOUT)
            .open()
            .map_err(|e| TransportError::Open {
                port: path.to_string(),
                source: e.into(),
            })?;
        info!(port = path, line = %settings, "opened serial port");
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    /// Borrow the underlying port.
    pub fn get_ref(&self) -> &dyn SerialPort {
        self.port.as_ref()
    }

    fn pending(&self) -> u32 {
        match self.port.bytes_to_read() {
            Ok(n) => n,
            Err(e) => {
                debug!(port = %self.name, error = %e, "bytes_to_read failed");
                0
            }
        }
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SerialTransport for SerialPortTransport {
    fn configure(&mut self, settings: &LineSettings) -> Result<u32> {
        self.port
            .set_data_bits(data_bits(settings.data_bits))
            .map_err(serial_error)?;
        self.port
            .set_stop_bits(stop_bits(settings.stop_bits))
            .map_err(serial_error)?;
        self.port
            .set_parity(parity(settings.parity))
            .map_err(serial_error)?;
        self.set_baud_rate(settings.baud_rate)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<u32> {
        self.port.set_baud_rate(baud_rate).map_err(serial_error)?;
        let actual = self.port.baud_rate().map_err(serial_error)?;
        debug!(port = %self.name, requested = baud_rate, actual, "baud rate set");
        Ok(actual)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(port = %self.name, len = bytes.len(), "tx");
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn byte_ready_now(&mut self) -> bool {
        self.pending() > 0
    }

    fn byte_ready_within(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.pending() > 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn read_one(&mut self) -> Option<u8> {
        if self.pending() == 0 {
            return None;
        }
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(e) => {
                debug!(port = %self.name, error = %e, "read failed");
                None
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A serial device visible to the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

/// Enumerate serial ports on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(serial_error)?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            kind: match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => match usb.product {
                    Some(product) => format!("usb {:04x}:{:04x} {product}", usb.vid, usb.pid),
                    None => format!("usb {:04x}:{:04x}", usb.vid, usb.pid),
                },
                serialport::SerialPortType::PciPort => "pci".to_string(),
                serialport::SerialPortType::BluetoothPort => "bluetooth".to_string(),
                serialport::SerialPortType::Unknown => "unknown".to_string(),
            },
            name: p.port_name,
        })
        .collect())
}

fn serial_error(e: serialport::Error) -> TransportError {
    TransportError::Serial(e.to_string())
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

fn parity(p: Parity) -> serialport::Parity {
    match p {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device_reports_path() {
        let err = SerialPortTransport::open(
            "/dev/dxlink-test-does-not-exist",
            &LineSettings::default(),
        )
        .unwrap_err();
        match err {
            TransportError::Open { port, .. } => {
                assert_eq!(port, "/dev/dxlink-test-does-not-exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_line_mapping() {
        assert_eq!(data_bits(DataBits::Eight), serialport::DataBits::Eight);
        assert_eq!(stop_bits(StopBits::Two), serialport::StopBits::Two);
        assert_eq!(parity(Parity::Even), serialport::Parity::Even);
    }
}
