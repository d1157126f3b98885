use std::time::Duration;

use dxlink_transport::SerialTransport;
use tracing::{debug, trace};

use crate::codec::{decode_status, Decoded, StatusPacket, HEADER};
use crate::error::{FrameError, Result};
use crate::instruction::instruction_name;

/// Smallest receive buffer a session accepts.
pub const MIN_BUFFER_SIZE: usize = 20;

/// Receive buffer size used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Bytes kept while seeking: a header minus its last byte.
const PARTIAL_HEADER_TAIL: usize = HEADER.len() - 1;

/// Where the reader stands relative to the next status packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No header seen. Only a trailing partial header is worth keeping.
    Seeking,
    /// A header starts at `start`; everything from there on is kept.
    PartialFrame { start: usize },
}

/// A fixed-capacity byte arena that accumulates a status packet.
///
/// Compaction never discards a byte that could still belong to a header: in
/// [`SyncState::Seeking`] the last three bytes are kept, in
/// [`SyncState::PartialFrame`] everything from the header on is kept and
/// moved to offset 0.
#[derive(Debug)]
pub struct ReceiveBuffer {
    buf: Vec<u8>,
    len: usize,
}

impl ReceiveBuffer {
    /// Create a buffer of `capacity` bytes, raised to [`MIN_BUFFER_SIZE`].
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(MIN_BUFFER_SIZE)],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// The bytes accumulated so far.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Zero the buffer for a new exchange.
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.len = 0;
    }

    /// Append one byte. Returns false if the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        true
    }

    /// Move immediately available bytes from `transport` into the buffer.
    ///
    /// Reads at most half the capacity per call and stops early when the
    /// transport has nothing more or the buffer is full. Returns the number of
    /// bytes read.
    pub fn refill<T: SerialTransport + ?Sized>(&mut self, transport: &mut T) -> usize {
        let budget = self.capacity() / 2;
        let mut read = 0;
        while read < budget && !self.is_full() {
            match transport.read_one() {
                Some(byte) => {
                    self.push(byte);
                    read += 1;
                }
                None => break,
            }
        }
        read
    }

    /// Discard bytes that cannot be part of the next packet.
    pub fn compact(&mut self, state: SyncState) {
        let keep_from = match state {
            SyncState::Seeking => self.len.saturating_sub(PARTIAL_HEADER_TAIL),
            SyncState::PartialFrame { start } => start.min(self.len),
        };
        if keep_from == 0 {
            return;
        }
        self.buf.copy_within(keep_from..self.len, 0);
        self.len -= keep_from;
        self.buf[self.len..].fill(0);
    }

    /// Try to decode a status packet from the accumulated bytes.
    pub fn decode(&self) -> Decoded<StatusPacket> {
        decode_status(self.filled())
    }
}

/// Reads one status packet per exchange into a [`ReceiveBuffer`].
///
/// The reader does not own the transport; the session lends it for each read.
#[derive(Debug)]
pub struct StatusReader {
    buffer: ReceiveBuffer,
}

impl StatusReader {
    /// Create a reader with the default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a reader whose buffer holds `capacity` bytes (at least
    /// [`MIN_BUFFER_SIZE`]).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: ReceiveBuffer::new(capacity),
        }
    }

    /// Read the status packet answering an instruction sent to `expected_id`.
    ///
    /// Waits up to `wait` for the first byte, then keeps refilling while more
    /// bytes arrive within `wait` of each other. Never retries.
    pub fn read_status<T: SerialTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        expected_id: u8,
        wait: Duration,
    ) -> Result<StatusPacket> {
        self.buffer.reset();

        if !transport.byte_ready_within(wait) {
            debug!(id = expected_id, ?wait, "no response");
            return Err(FrameError::NoResponse { wait });
        }

        loop {
            self.buffer.refill(transport);

            if self.buffer.is_full() && transport.byte_ready_now() {
                debug!(
                    id = expected_id,
                    capacity = self.buffer.capacity(),
                    "receive buffer overflow"
                );
                return Err(FrameError::OversizedData {
                    capacity: self.buffer.capacity(),
                });
            }

            match self.buffer.decode() {
                Decoded::Complete { packet, .. } => {
                    trace!(
                        id = packet.id,
                        instruction = instruction_name(packet.instruction),
                        error = packet.error,
                        params = ?packet.params.as_ref(),
                        "rx"
                    );
                    return check_packet(packet, expected_id);
                }
                Decoded::BadChecksum {
                    computed,
                    received,
                    packet,
                    ..
                } => {
                    debug!(
                        id = packet.id,
                        computed,
                        received,
                        params = ?packet.params.as_ref(),
                        "status checksum mismatch"
                    );
                    return Err(FrameError::WrongChecksum);
                }
                Decoded::Malformed { start } => {
                    debug!(start, "status length field too small");
                    return Err(FrameError::WrongChecksum);
                }
                Decoded::Incomplete { start } => {
                    self.buffer.compact(SyncState::PartialFrame { start });
                }
                Decoded::HeaderNotFound => {
                    self.buffer.compact(SyncState::Seeking);
                }
            }

            if !transport.byte_ready_within(wait) {
                break;
            }
        }

        debug!(id = expected_id, buffered = self.buffer.len(), "incomplete status");
        Err(FrameError::IncompleteData)
    }

    /// Borrow the receive buffer.
    pub fn buffer(&self) -> &ReceiveBuffer {
        &self.buffer
    }
}

impl Default for StatusReader {
    fn default() -> Self {
        Self::new()
    }
}

fn check_packet(packet: StatusPacket, expected_id: u8) -> Result<StatusPacket> {
    if packet.error != 0 {
        return Err(FrameError::StatusError {
            id: packet.id,
            status: packet.status(),
        });
    }
    if packet.id != expected_id {
        return Err(FrameError::WrongId {
            expected: expected_id,
            actual: packet.id,
        });
    }
    Ok(packet)
}
