use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::crc16_ibm;
use crate::error::{FrameError, Result};
use crate::instruction::STATUS;
use crate::status::DeviceStatus;

/// Packet header: three signature bytes plus a reserved zero.
pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// The part of the header that byte stuffing guards against.
pub const SIGNATURE: [u8; 3] = [0xFF, 0xFF, 0xFD];

/// Byte inserted after every signature run inside a payload.
pub const STUFFING_BYTE: u8 = 0xFD;

/// Header (4) + id (1) + length (2).
pub const PREFIX_SIZE: usize = 7;

/// Trailing CRC width.
pub const CRC_SIZE: usize = 2;

/// Smallest length field of an instruction packet: instruction + CRC.
pub const MIN_INSTRUCTION_LENGTH: usize = 3;

/// Smallest length field of a status packet: instruction + error + CRC.
pub const MIN_STATUS_LENGTH: usize = 4;

/// An instruction packet (controller to device).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPacket {
    pub id: u8,
    pub instruction: u8,
    pub params: Bytes,
}

/// A status packet (device to controller), with parameters de-stuffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    pub id: u8,
    pub instruction: u8,
    pub error: u8,
    pub params: Bytes,
}

impl StatusPacket {
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus(self.error)
    }
}

/// Result of scanning a buffer for a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<P> {
    /// No header in the buffer. Only its last three bytes can still start one.
    HeaderNotFound,
    /// A header starts at `start` but the packet is not complete yet.
    Incomplete { start: usize },
    /// The length field at `start` is too small for this packet kind.
    Malformed { start: usize },
    /// A complete packet at `start` failed its checksum. The packet is still
    /// extracted for diagnostics.
    BadChecksum {
        start: usize,
        computed: u16,
        received: u16,
        packet: P,
    },
    /// A valid packet occupying `start..start + frame_len`.
    Complete {
        start: usize,
        frame_len: usize,
        packet: P,
    },
}

/// Append `params` to `dst` with byte stuffing applied. Returns the number of
/// bytes written.
///
/// A stuffing byte follows every position where the three preceding payload
/// bytes equal [`SIGNATURE`]. Payloads shorter than three bytes are copied
/// unchanged.
pub fn stuff(params: &[u8], dst: &mut BytesMut) -> usize {
    let before = dst.len();
    dst.reserve(params.len() + params.len() / 3);
    for (i, &b) in params.iter().enumerate() {
        dst.put_u8(b);
        if i >= 2 && params[i - 2..=i] == SIGNATURE {
            dst.put_u8(STUFFING_BYTE);
        }
    }
    dst.len() - before
}

/// Length of `params` after stuffing.
pub fn stuffed_len(params: &[u8]) -> usize {
    params.len() + params.windows(3).filter(|w| *w == SIGNATURE).count()
}

/// Remove stuffing bytes from a raw parameter region.
///
/// A byte is dropped when the three raw bytes before it equal [`SIGNATURE`].
/// Exactly inverts [`stuff`].
pub fn unstuff(raw: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(raw.len());
    for (j, &b) in raw.iter().enumerate() {
        if j >= 3 && raw[j - 3..j] == SIGNATURE {
            continue;
        }
        out.put_u8(b);
    }
    out.freeze()
}

/// Encode an instruction packet into `dst`. Returns the frame length.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────┬──────────┬───────┬──────────────────┬──────────┐
/// │ FF FF FD 00  │ ID │ Length   │ Instr │ Params (stuffed) │ CRC      │
/// │              │    │ (2B LE)  │       │                  │ (2B LE)  │
/// └──────────────┴────┴──────────┴───────┴──────────────────┴──────────┘
/// ```
/// Length counts instruction, stuffed params and CRC. The CRC covers every
/// byte before it.
pub fn encode_instruction(
    id: u8,
    instruction: u8,
    params: &[u8],
    dst: &mut BytesMut,
) -> Result<usize> {
    encode(id, &[instruction], params, dst)
}

/// Encode a status packet into `dst`. Returns the frame length.
///
/// Same layout as an instruction packet, with the [`STATUS`] marker and an
/// error byte ahead of the params.
pub fn encode_status(id: u8, error: u8, params: &[u8], dst: &mut BytesMut) -> Result<usize> {
    encode(id, &[STATUS, error], params, dst)
}

fn encode(id: u8, lead: &[u8], params: &[u8], dst: &mut BytesMut) -> Result<usize> {
    let length = lead.len() + stuffed_len(params) + CRC_SIZE;
    if length > u16::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: length,
            max: u16::MAX as usize,
        });
    }

    let start = dst.len();
    dst.reserve(PREFIX_SIZE + length);
    dst.put_slice(&HEADER);
    dst.put_u8(id);
    dst.put_u16_le(length as u16);
    dst.put_slice(lead);
    stuff(params, dst);
    let crc = crc16_ibm(&dst[start..]);
    dst.put_u16_le(crc);
    Ok(dst.len() - start)
}

/// Scan `buf` for a status packet.
///
/// The parameter region is the bytes between the error byte and the CRC.
pub fn decode_status(buf: &[u8]) -> Decoded<StatusPacket> {
    decode(buf, MIN_STATUS_LENGTH, |id, body| StatusPacket {
        id,
        instruction: body[0],
        error: body[1],
        params: unstuff(&body[2..]),
    })
}

/// Scan `buf` for an instruction packet.
pub fn decode_instruction(buf: &[u8]) -> Decoded<InstructionPacket> {
    decode(buf, MIN_INSTRUCTION_LENGTH, |id, body| InstructionPacket {
        id,
        instruction: body[0],
        params: unstuff(&body[1..]),
    })
}

/// Index of the first complete header in `buf`.
pub fn find_header(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER.len()).position(|w| w == HEADER)
}

// `build` receives the id and the bytes between the length field and the CRC;
// `min_length` guarantees the body holds the fixed fields it indexes.
fn decode<P>(buf: &[u8], min_length: usize, build: impl Fn(u8, &[u8]) -> P) -> Decoded<P> {
    let Some(start) = find_header(buf) else {
        return Decoded::HeaderNotFound;
    };

    if buf.len() < start + PREFIX_SIZE {
        return Decoded::Incomplete { start };
    }

    let id = buf[start + 4];
    let length = u16::from_le_bytes([buf[start + 5], buf[start + 6]]) as usize;
    if length < min_length {
        return Decoded::Malformed { start };
    }

    let frame_len = PREFIX_SIZE + length;
    if buf.len() < start + frame_len {
        return Decoded::Incomplete { start };
    }

    let frame = &buf[start..start + frame_len];
    let crc_at = frame_len - CRC_SIZE;
    let computed = crc16_ibm(&frame[..crc_at]);
    let received = u16::from_le_bytes([frame[crc_at], frame[crc_at + 1]]);
    let packet = build(id, &frame[PREFIX_SIZE..crc_at]);

    if computed != received {
        return Decoded::BadChecksum {
            start,
            computed,
            received,
            packet,
        };
    }

    Decoded::Complete {
        start,
        frame_len,
        packet,
    }
}
