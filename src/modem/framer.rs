//! Line framing of the modem byte stream.
//!
//! NUL and carriage-return bytes are dropped, a line-feed completes a line.
//! When the pending command waits for a single character (the `>` prompt of
//! `AT+CMGS`), the arrival of that character completes the line on its own.

use heapless::{String, Vec};

/// Size of the answer buffer
pub const MAX_ANSWER: usize = 500;

/// Buffered length at which the next byte overflows the line
const OVERFLOW_AT: usize = MAX_ANSWER - 2;

const NUL: u8 = 0x00;
const CR: u8 = 0x0D;
const LF: u8 = 0x0A;

/// A completed line
pub type Line = String<MAX_ANSWER>;

/// Result of feeding one byte to the framer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Byte absorbed, no line yet
    Pending,
    /// A line is complete and can be taken
    Line,
    /// The line exceeded the buffer and was discarded
    Overflow,
}

/// Accumulates bytes into lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8, MAX_ANSWER>,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. `marker` is the single-character answer the pending
    /// command waits for, if any.
    pub fn push(&mut self, byte: u8, marker: Option<u8>) -> Feed {
        if byte == NUL || byte == CR {
            return Feed::Pending;
        }
        if self.buffer.len() >= OVERFLOW_AT {
            self.buffer.clear();
            return Feed::Overflow;
        }
        if byte == LF {
            return Feed::Line;
        }
        // Cannot fail: the length is below OVERFLOW_AT
        let _ = self.buffer.push(byte);
        if marker == Some(byte) {
            Feed::Line
        } else {
            Feed::Pending
        }
    }

    /// Take the buffered line, leaving the framer empty. Invalid UTF-8 is
    /// cut at the first bad sequence.
    pub fn take_line(&mut self) -> Line {
        let mut bytes = core::mem::take(&mut self.buffer);
        if let Err(e) = core::str::from_utf8(&bytes) {
            bytes.truncate(e.valid_up_to());
        }
        String::from_utf8(bytes).unwrap_or_default()
    }

    /// Drop any partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// True when no partial line is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }
}
