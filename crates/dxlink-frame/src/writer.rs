use bytes::BytesMut;
use dxlink_transport::SerialTransport;
use tracing::trace;

use crate::codec::encode_instruction;
use crate::error::{FrameError, Result};
use crate::instruction::instruction_name;
use crate::reader::{DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};

/// Encodes instruction packets into a bounded send buffer and writes them to
/// a transport.
#[derive(Debug)]
pub struct InstructionWriter {
    buf: BytesMut,
    capacity: usize,
}

impl InstructionWriter {
    /// Create a writer with the default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer that refuses frames longer than `capacity` bytes
    /// (at least [`MIN_BUFFER_SIZE`]).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_SIZE);
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Encode and send one instruction packet. Returns the frame length.
    pub fn send<T: SerialTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        id: u8,
        instruction: u8,
        params: &[u8],
    ) -> Result<usize> {
        self.buf.clear();
        let len = encode_instruction(id, instruction, params, &mut self.buf)?;
        if len > self.capacity {
            self.buf.clear();
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.capacity,
            });
        }

        trace!(
            port = transport.name(),
            id,
            instruction = instruction_name(instruction),
            frame = ?self.buf.as_ref(),
            "tx"
        );
        transport.send(&self.buf)?;
        Ok(len)
    }

    /// The most recently encoded frame.
    pub fn last_frame(&self) -> &[u8] {
        &self.buf
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InstructionWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use dxlink_transport::ScriptedTransport;

    use super::*;
    use crate::instruction::{PING, READ, WRITE};

    #[test]
    fn send_ping() {
        let mut t = ScriptedTransport::new("mock");
        let mut writer = InstructionWriter::new();
        let n = writer.send(&mut t, 1, PING, &[]).unwrap();
        assert_eq!(n, 10);
        assert_eq!(
            t.sent(),
            &[vec![0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]]
        );
        assert_eq!(writer.last_frame(), t.sent()[0].as_slice());
    }

    #[test]
    fn buffer_reused_between_sends() {
        let mut t = ScriptedTransport::new("mock");
        let mut writer = InstructionWriter::with_capacity(20);
        writer.send(&mut t, 1, READ, &[0x84, 0x00, 0x04, 0x00]).unwrap();
        writer.send(&mut t, 1, PING, &[]).unwrap();
        assert_eq!(t.sent()[1].len(), 10);
    }

    #[test]
    fn frame_larger_than_buffer_rejected() {
        let mut t = ScriptedTransport::new("mock");
        let mut writer = InstructionWriter::with_capacity(20);
        let err = writer.send(&mut t, 1, WRITE, &[0u8; 16]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 26, max: 20 }));
        assert!(t.sent().is_empty());
    }

    #[test]
    fn transport_failure_propagates() {
        let mut t = ScriptedTransport::new("mock").fail_sends(1);
        let mut writer = InstructionWriter::new();
        let err = writer.send(&mut t, 1, PING, &[]).unwrap_err();
        assert!(matches!(err, FrameError::Transport(_)));
    }
}
