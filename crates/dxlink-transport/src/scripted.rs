use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{LineSettings, SerialTransport, DEFAULT_BAUD_RATE};

/// An in-memory transport that answers each `send` with a pre-scripted reply.
///
/// Every reply is a list of chunks. A chunk becomes readable when the reader
/// waits for data, so a multi-chunk reply models a response that trickles in
/// across several polls. An empty reply models a silent device.
///
/// Everything written to the line, every baud change and every wait is
/// recorded for later inspection.
#[derive(Debug)]
pub struct ScriptedTransport {
    name: String,
    baud_rate: u32,
    max_baud_rate: Option<u32>,
    replies: VecDeque<Vec<Vec<u8>>>,
    arrivals: VecDeque<Vec<u8>>,
    pending: VecDeque<u8>,
    failing_sends: usize,
    sent: Vec<Vec<u8>>,
    baud_changes: Vec<u32>,
    waits: Vec<Duration>,
}

impl ScriptedTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            max_baud_rate: None,
            replies: VecDeque::new(),
            arrivals: VecDeque::new(),
            pending: VecDeque::new(),
            failing_sends: 0,
            sent: Vec::new(),
            baud_changes: Vec::new(),
            waits: Vec::new(),
        }
    }

    /// Queue a reply delivered in one piece.
    pub fn reply(mut self, bytes: &[u8]) -> Self {
        self.replies.push_back(vec![bytes.to_vec()]);
        self
    }

    /// Queue a reply delivered as several separate chunks.
    pub fn reply_chunks(mut self, chunks: &[&[u8]]) -> Self {
        self.replies
            .push_back(chunks.iter().map(|c| c.to_vec()).collect());
        self
    }

    /// Queue a send that gets no answer.
    pub fn silence(mut self) -> Self {
        self.replies.push_back(Vec::new());
        self
    }

    /// Queue `n` consecutive unanswered sends.
    pub fn silence_n(mut self, n: usize) -> Self {
        for _ in 0..n {
            self.replies.push_back(Vec::new());
        }
        self
    }

    /// Make the next `n` sends fail with an I/O error.
    pub fn fail_sends(mut self, n: usize) -> Self {
        self.failing_sends = n;
        self
    }

    /// Cap applied rates at `max`, like an adapter with a top speed.
    pub fn max_baud_rate(mut self, max: u32) -> Self {
        self.max_baud_rate = Some(max);
        self
    }

    /// Every frame written so far, one entry per `send`.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Every baud rate applied, in order.
    pub fn baud_changes(&self) -> &[u32] {
        &self.baud_changes
    }

    /// Every timeout passed to `byte_ready_within`, in order.
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// The baud rate currently in effect.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Replies that were scripted but never consumed.
    pub fn unused_replies(&self) -> usize {
        self.replies.len()
    }
}

impl SerialTransport for ScriptedTransport {
    fn configure(&mut self, settings: &LineSettings) -> Result<u32> {
        self.set_baud_rate(settings.baud_rate)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<u32> {
        let applied = self.max_baud_rate.map_or(baud_rate, |max| baud_rate.min(max));
        self.baud_rate = applied;
        self.baud_changes.push(applied);
        Ok(applied)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.failing_sends > 0 {
            self.failing_sends -= 1;
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted send failure",
            )));
        }
        trace!(port = %self.name, len = bytes.len(), "tx");
        self.sent.push(bytes.to_vec());
        if let Some(reply) = self.replies.pop_front() {
            self.arrivals.extend(reply);
        }
        Ok(())
    }

    fn byte_ready_now(&mut self) -> bool {
        !self.pending.is_empty()
    }

    fn byte_ready_within(&mut self, timeout: Duration) -> bool {
        self.waits.push(timeout);
        if !self.pending.is_empty() {
            return true;
        }
        match self.arrivals.pop_front() {
            Some(chunk) if !chunk.is_empty() => {
                self.pending.extend(chunk);
                true
            }
            _ => false,
        }
    }

    fn read_one(&mut self) -> Option<u8> {
        self.pending.pop_front()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_arrives_after_send() {
        let mut t = ScriptedTransport::new("mock").reply(&[1, 2, 3]);
        assert!(!t.byte_ready_within(Duration::from_millis(1)));

        t.send(&[0xAA]).unwrap();
        assert!(!t.byte_ready_now());
        assert!(t.byte_ready_within(Duration::from_millis(1)));
        assert_eq!(t.read_one(), Some(1));
        assert_eq!(t.read_one(), Some(2));
        assert_eq!(t.read_one(), Some(3));
        assert_eq!(t.read_one(), None);
        assert_eq!(t.sent(), &[vec![0xAA]]);
    }

    #[test]
    fn test_chunks_released_one_wait_at_a_time() {
        let mut t = ScriptedTransport::new("mock").reply_chunks(&[&[1], &[2, 3]]);
        t.send(&[0]).unwrap();

        assert!(t.byte_ready_within(Duration::ZERO));
        assert_eq!(t.read_one(), Some(1));
        assert_eq!(t.read_one(), None);
        assert!(t.byte_ready_within(Duration::ZERO));
        assert_eq!(t.read_one(), Some(2));
        assert_eq!(t.read_one(), Some(3));
        assert!(!t.byte_ready_within(Duration::ZERO));
        assert_eq!(t.waits().len(), 3);
    }

    #[test]
    fn test_silence_and_failures() {
        let mut t = ScriptedTransport::new("mock").silence().fail_sends(1);
        assert!(t.send(&[1]).is_err());
        t.send(&[2]).unwrap();
        assert!(!t.byte_ready_within(Duration::ZERO));
        assert_eq!(t.sent().len(), 1);
    }

    #[test]
    fn test_baud_changes_recorded() {
        let mut t = ScriptedTransport::new("mock");
        t.configure(&LineSettings::with_baud_rate(9600)).unwrap();
        t.set_baud_rate(1_000_000).unwrap();
        assert_eq!(t.baud_changes(), &[9600, 1_000_000]);
        assert_eq!(t.baud_rate(), 1_000_000);
    }

    #[test]
    fn test_applied_rate_capped() {
        let mut t = ScriptedTransport::new("mock").max_baud_rate(3_000_000);
        assert_eq!(t.set_baud_rate(4_000_000).unwrap(), 3_000_000);
        assert_eq!(t.set_baud_rate(57_600).unwrap(), 57_600);
        assert_eq!(t.baud_changes(), &[3_000_000, 57_600]);
    }
}
