//! Little-endian integer packing for register values.
//!
//! Registers are 1, 2 or 4 bytes wide. Signed quantities (velocity, current,
//! position) are stored in two's complement at their register width.

/// Combine up to four little-endian bytes into an unsigned value.
///
/// Bytes beyond the fourth are ignored.
pub fn combine(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)))
}

/// Split `value` into `width` little-endian bytes (width 1, 2 or 4).
pub fn split(value: u32, width: usize) -> Vec<u8> {
    value.to_le_bytes().into_iter().take(width.min(4)).collect()
}

/// Reinterpret the low `width` bytes of `raw` as a two's-complement integer.
pub fn sign_extend(raw: u32, width: usize) -> i32 {
    match width {
        1 => raw as u8 as i8 as i32,
        2 => raw as u16 as i16 as i32,
        _ => raw as i32,
    }
}

/// Combine little-endian bytes as a signed value of the slice's width.
pub fn combine_signed(bytes: &[u8]) -> i32 {
    sign_extend(combine(bytes), bytes.len())
}

pub fn split_u16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

pub fn combine_u16(low: u8, high: u8) -> u16 {
    u16::from_le_bytes([low, high])
}
