//! Byte cursor for XML scanning
//!
//! Delimiter searches go through memchr, which picks SSE2/AVX2/NEON
//! at runtime. The cursor never copies input; every accessor hands out
//! borrowed slices or offsets into the original document.

use memchr::{memchr, memmem};

/// Cursor over an XML document
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Current byte offset into the input
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Bytes between two absolute offsets, empty if the range is out of bounds
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        self.input.get(start..end).unwrap_or(&[])
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes, clamped to the end of input
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Skip XML whitespace (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Absolute offset of the next occurrence of `byte`
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Absolute offset of the next occurrence of a multi-byte terminator
    /// such as `-->`, `]]>` or `?>`
    #[inline]
    pub fn find_sequence(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Read an XML name and advance past it
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if !is_name_start_char(self.peek()?) {
            return None;
        }
        self.pos += 1;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

/// ASCII letters, underscore, colon, and any non-ASCII (UTF-8) byte
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

#[inline]
pub fn is_name_char(b: u8) -> bool {
    is_name_start_char(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

/// True if `name` is a complete, valid XML name
pub fn is_valid_name(name: &[u8]) -> bool {
    match name.split_first() {
        Some((&first, rest)) => is_name_start_char(first) && rest.iter().all(|&b| is_name_char(b)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_byte() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_byte(b'<'), Some(6));
    }

    #[test]
    fn test_find_sequence_from_position() {
        let mut scanner = Scanner::new(b"<!-- a -- b -->x");
        scanner.advance(4);
        assert_eq!(scanner.find_sequence(b"-->"), Some(12));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"element-name>");
        assert_eq!(scanner.read_name(), Some(b"element-name" as &[u8]));
        assert_eq!(scanner.position(), 12);
    }

    #[test]
    fn test_read_name_rejects_digit_start() {
        let mut scanner = Scanner::new(b"1abc");
        assert_eq!(scanner.read_name(), None);
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_skip_whitespace() {
        let mut scanner = Scanner::new(b"  \t\n hello");
        scanner.skip_whitespace();
        assert_eq!(scanner.position(), 5);
    }

    #[test]
    fn test_advance_clamps_to_end() {
        let mut scanner = Scanner::new(b"ab");
        scanner.advance(10);
        assert_eq!(scanner.peek(), None);
        assert_eq!(scanner.position(), 2);
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name(b"page"));
        assert!(is_valid_name(b"ns:page-1.x"));
        assert!(!is_valid_name(b""));
        assert!(!is_valid_name(b"1page"));
        assert!(!is_valid_name(b"pa ge"));
    }
}
