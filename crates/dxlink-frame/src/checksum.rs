//! CRC-16/IBM as used on the wire.
//!
//! Polynomial 0x8005, initial value 0, no reflection, no final XOR. The
//! result is transmitted low byte first.

/// Generator polynomial.
pub const POLYNOMIAL: u16 = 0x8005;

/// Compute the checksum of `bytes`.
pub fn crc16_ibm(bytes: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
