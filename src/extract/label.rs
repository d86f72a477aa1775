//! Label Extractor
//!
//! The label start offset points at the opening `<` of the label tag, so
//! the text begins a fixed `<name>` length later. The end offset points at
//! the `<` of the closing tag, which is where the text ends. A label whose
//! start tag carries attributes is therefore not supported.

use std::borrow::Cow;

use crate::error::{ExtractError, Result};

#[derive(Debug)]
pub struct LabelBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    /// Length of `<name>` for the label element
    tag_len: usize,
}

impl LabelBuffer {
    pub fn new(label_element: &str, capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            tag_len: label_element.len() + 2,
        }
    }

    /// Replace the buffer contents with the label text at `start..end`
    ///
    /// A self-closing label (`start == end`) yields an empty label.
    pub fn capture(&mut self, document: &[u8], sequence: u64, start: usize, end: usize) -> Result<()> {
        let text_start = start + self.tag_len;
        let text = if end > text_start {
            document.get(text_start..end).ok_or_else(|| ExtractError::Span {
                role: "label",
                start: text_start,
                end,
                document_len: document.len(),
            })?
        } else {
            &[]
        };

        if text.len() > self.capacity {
            return Err(ExtractError::LabelTooLong {
                sequence,
                offset: start,
                len: text.len(),
                capacity: self.capacity,
            });
        }

        self.bytes.clear();
        self.bytes.extend_from_slice(text);
        Ok(())
    }

    /// Raw label text; invalid UTF-8 is replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &[u8] = b"<rec><id>Alpha</id><id/><id></id></rec>";

    #[test]
    fn test_capture_skips_opening_tag() {
        let mut label = LabelBuffer::new("id", 64);
        // <id> at 5, </id> at 14
        label.capture(DOC, 1, 5, 14).unwrap();
        assert_eq!(label.text(), "Alpha");
    }

    #[test]
    fn test_self_closing_and_empty_labels() {
        let mut label = LabelBuffer::new("id", 64);
        label.capture(DOC, 1, 5, 14).unwrap();
        // <id/> at 19
        label.capture(DOC, 1, 19, 19).unwrap();
        assert_eq!(label.text(), "");
        // <id></id> at 24, </id> at 28
        label.capture(DOC, 1, 24, 28).unwrap();
        assert!(label.as_bytes().is_empty());
    }

    #[test]
    fn test_label_too_long() {
        let mut label = LabelBuffer::new("id", 4);
        label.capture(DOC, 1, 24, 28).unwrap();
        let err = label.capture(DOC, 9, 5, 14).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::LabelTooLong {
                sequence: 9,
                len: 5,
                capacity: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_exact_capacity_fits() {
        let mut label = LabelBuffer::new("id", 5);
        label.capture(DOC, 1, 5, 14).unwrap();
        assert_eq!(label.text(), "Alpha");
    }

    #[test]
    fn test_clear() {
        let mut label = LabelBuffer::new("id", 64);
        label.capture(DOC, 1, 5, 14).unwrap();
        label.clear();
        assert_eq!(label.text(), "");
    }
}
