//! Incremental frame reassembly.
//!
//! A stream delivers bytes with no respect for message boundaries. The
//! assembler owns a fixed-capacity buffer: readers append whatever the
//! socket produced, then drain as many complete messages as the buffered
//! bytes allow. A partial message stays at the front until more bytes
//! arrive; consumed bytes are compacted out.

use super::error::WireResult;
use super::message::{self, Message, HEADER_SIZE};

/// Receive buffer capacity per connection
pub const RECV_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct Assembler {
    buf: Box<[u8]>,
    len: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; RECV_BUFFER_SIZE].into_boxed_slice(),
            len: 0,
        }
    }

    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.len
    }

    /// Writable tail for the next socket read
    pub fn free_space(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Mark `n` bytes of the tail as filled (after a successful read)
    pub fn commit(&mut self, n: usize) {
        debug_assert!(self.len + n <= self.buf.len());
        self.len += n;
    }

    /// Copy bytes in (test and client convenience); returns how many fit
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.buf.len() - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Drain the next complete message, or `Ok(None)` when more bytes are
    /// needed. Errors are protocol violations; the buffer is left as-is so
    /// the caller can tear the connection down.
    pub fn next_message(&mut self) -> WireResult<Option<Message>> {
        if self.len < HEADER_SIZE {
            return Ok(None);
        }

        let mut header_buf = [0u8; HEADER_SIZE];
        header_buf.copy_from_slice(&self.buf[..HEADER_SIZE]);
        let header = message::decode_header(&header_buf)?;

        let total = HEADER_SIZE + header.length as usize;
        if self.len < total {
            return Ok(None);
        }

        let msg = message::decode_payload(&header, &self.buf[HEADER_SIZE..total])?;

        // Compact the consumed message out of the front
        self.buf.copy_within(total..self.len, 0);
        self.len -= total;

        Ok(Some(msg))
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attack, Side};
    use crate::wire::message::{encode_to_vec, Payload};

    #[test]
    fn partial_header_waits() {
        let mut asm = Assembler::new();
        asm.push(&[0, 1]);
        assert_eq!(asm.next_message().unwrap(), None);
        assert_eq!(asm.buffered(), 2);
    }

    #[test]
    fn partial_payload_waits() {
        let bytes = encode_to_vec(&Message {
            side: Side::Zero,
            payload: Payload::Attack(Attack { rows: 1, column: 4 }),
        });
        let mut asm = Assembler::new();
        asm.push(&bytes[..bytes.len() - 1]);
        assert_eq!(asm.next_message().unwrap(), None);
        asm.push(&bytes[bytes.len() - 1..]);
        let msg = asm.next_message().unwrap().expect("complete message");
        assert_eq!(msg.side, Side::Zero);
        assert_eq!(asm.buffered(), 0);
    }

    #[test]
    fn two_messages_in_one_read() {
        let a = encode_to_vec(&Message {
            side: Side::Zero,
            payload: Payload::SideAssign,
        });
        let b = encode_to_vec(&Message {
            side: Side::One,
            payload: Payload::Attack(Attack { rows: 2, column: 0 }),
        });
        let mut joined = a.clone();
        joined.extend_from_slice(&b);

        let mut asm = Assembler::new();
        asm.push(&joined);
        let first = asm.next_message().unwrap().unwrap();
        assert_eq!(first.payload, Payload::SideAssign);
        let second = asm.next_message().unwrap().unwrap();
        assert_eq!(second.payload, Payload::Attack(Attack { rows: 2, column: 0 }));
        assert_eq!(asm.next_message().unwrap(), None);
    }

    #[test]
    fn violation_surfaces_as_error() {
        let mut asm = Assembler::new();
        asm.push(&[99, 0, 0, 0]);
        assert!(asm.next_message().is_err());
    }
}
