//! Capture buffer for one command's response.
//!
//! Output is accumulated with a doubling growth policy so allocation cost
//! stays predictable for large responses, and terminal escape sequences are
//! stripped on the way in so prompt detection sees plain text.

use std::collections::TryReserveError;

use vte::{Parser, Perform};

use super::patterns::PromptMatcher;

/// Initial capacity of a capture buffer, in bytes.
pub const INITIAL_CAPACITY: usize = 4096;

/// Growable buffer that accumulates device output.
///
/// The logical capacity only ever doubles, and the written length is kept
/// strictly below it.
pub struct CaptureBuffer {
    /// The accumulated, escape-stripped output.
    buffer: Vec<u8>,

    /// Logical capacity, grown by doubling.
    capacity: usize,

    /// Escape parser, kept across chunks so split sequences are handled.
    parser: Parser,

    /// Scratch space for the stripped form of the current chunk.
    scratch: Vec<u8>,
}

impl CaptureBuffer {
    /// Create an empty buffer with the given starting capacity.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            buffer: Vec::new(),
            capacity: initial_capacity.max(1),
            parser: Parser::new(),
            scratch: Vec::new(),
        }
    }

    /// Make room for a write of `incoming` bytes.
    ///
    /// Doubles the capacity until `len + incoming < capacity` holds.
    pub fn reserve_for(&mut self, incoming: usize) -> Result<(), TryReserveError> {
        let needed = self.buffer.len() + incoming;
        let mut target = self.capacity;
        while needed >= target {
            target *= 2;
        }
        if self.buffer.capacity() < target {
            self.buffer.try_reserve_exact(target - self.buffer.len())?;
        }
        self.capacity = target;
        Ok(())
    }

    /// Append raw channel bytes, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) -> Result<(), TryReserveError> {
        self.scratch.clear();
        self.scratch.try_reserve(data.len())?;
        self.parser.advance(
            &mut Stripper {
                out: &mut self.scratch,
            },
            data,
        );

        self.reserve_for(self.scratch.len())?;
        self.buffer.extend_from_slice(&self.scratch);
        Ok(())
    }

    /// Check whether the buffer currently ends with a prompt.
    pub fn ends_with_prompt<P: PromptMatcher + ?Sized>(&self, prompt: &P) -> bool {
        prompt.is_match(&self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the buffer, returning its contents as a string.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.buffer) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Logical capacity under the doubling policy.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new(INITIAL_CAPACITY)
    }
}

impl std::fmt::Debug for CaptureBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBuffer")
            .field("len", &self.buffer.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Keeps printable text and line control, drops escape sequences.
struct Stripper<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for Stripper<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        let bytes = c.encode_utf8(&mut utf8).as_bytes();
        self.out.extend_from_slice(bytes);
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::patterns::{DEFAULT_PROMPT, PromptPattern};

    #[test]
    fn test_basic_extend() {
        let mut buffer = CaptureBuffer::new(100);
        buffer.extend(b"Hello, world!").unwrap();
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = CaptureBuffer::default();
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\n").unwrap();
        assert_eq!(buffer.as_slice(), b"Green text\r\n");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = CaptureBuffer::default();
        buffer.extend(b"cpu \x1b[1").unwrap();
        buffer.extend(b";31m5%\x1b[0m").unwrap();
        assert_eq!(buffer.as_slice(), b"cpu 5%");
    }

    #[test]
    fn test_capacity_doubles() {
        let mut buffer = CaptureBuffer::new(4096);
        assert_eq!(buffer.capacity(), 4096);

        buffer.extend(&[b'x'; 3000]).unwrap();
        assert_eq!(buffer.capacity(), 4096);

        buffer.reserve_for(1024).unwrap();
        assert_eq!(buffer.capacity(), 4096);

        buffer.extend(&[b'x'; 1096]).unwrap();
        assert_eq!(buffer.len(), 4096);
        assert_eq!(buffer.capacity(), 8192);
        assert!(buffer.len() < buffer.capacity());

        buffer.reserve_for(20_000).unwrap();
        assert_eq!(buffer.capacity(), 32768);
    }

    #[test]
    fn test_length_stays_below_capacity() {
        let mut buffer = CaptureBuffer::new(16);
        for _ in 0..100 {
            buffer.extend(b"0123456789").unwrap();
            assert!(buffer.len() < buffer.capacity());
            assert!(buffer.capacity().is_power_of_two());
        }
    }

    #[test]
    fn test_prompt_detection() {
        let prompt = PromptPattern::new(DEFAULT_PROMPT).unwrap();
        let mut buffer = CaptureBuffer::default();

        buffer.extend(&[b'x'; 10_000]).unwrap();
        buffer.extend(b"\r\nrout").unwrap();
        assert!(!buffer.ends_with_prompt(&prompt));

        buffer.extend(b"er#").unwrap();
        assert!(buffer.ends_with_prompt(&prompt));
    }

    #[test]
    fn test_into_string() {
        let mut buffer = CaptureBuffer::default();
        buffer.extend("temp 41\u{b0}C\n".as_bytes()).unwrap();
        assert_eq!(buffer.into_string(), "temp 41\u{b0}C\n");
    }
}
