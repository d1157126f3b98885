//! Packet framing for half-duplex servo buses.
//!
//! Every packet is framed with:
//! - A 4-byte header (`FF FF FD 00`) for stream synchronization
//! - A 1-byte device ID and a 2-byte little-endian length
//! - An instruction code, byte-stuffed parameters and a CRC-16 trailer
//!
//! [`StatusReader`] turns the byte-at-a-time transport into whole status
//! packets, re-synchronizing on the header after partial or corrupt input.

pub mod byte_pair;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod instruction;
pub mod reader;
pub mod status;
pub mod writer;

pub use checksum::crc16_ibm;
pub use codec::{
    decode_instruction, decode_status, encode_instruction, encode_status, stuff, unstuff, Decoded,
    InstructionPacket, StatusPacket, HEADER, STUFFING_BYTE,
};
pub use error::{FrameError, Result};
pub use instruction::{
    instruction_name, FactoryResetMode, ACTION, BROADCAST_ID, FACTORY_RESET, PING, READ, REBOOT,
    REG_WRITE, STATUS, WRITE,
};
pub use reader::{ReceiveBuffer, StatusReader, SyncState, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use status::{DeviceStatus, StatusErrorKind};
pub use writer::InstructionWriter;
