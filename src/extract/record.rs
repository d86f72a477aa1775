//! Record Reconstructor
//!
//! One buffer holds the captured header followed by the active record.
//! Reconstruction truncates back to the header, copies the record bytes
//! and appends the trailer that closes the record and root elements.
//! The buffer is reserved once at header capture and never grows past
//! that reservation.
//!
//! A self-closing record has identical start and end offsets; it is
//! rebuilt as an empty `<record></record>` pair, without attributes.

use crate::error::{ExtractError, Result};

#[derive(Debug)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    header_len: usize,
    /// `<record>`, written in place of a self-closing record
    open_tag: Vec<u8>,
    /// Upper bound for header plus record bytes
    capacity: usize,
}

impl OutputBuffer {
    pub fn new(header: Vec<u8>, capacity: usize, record_element: &str) -> Self {
        Self {
            header_len: header.len(),
            bytes: header,
            open_tag: format!("<{record_element}>").into_bytes(),
            capacity,
        }
    }

    pub fn header(&self) -> &[u8] {
        &self.bytes[..self.header_len]
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Largest record that fits after the header
    pub fn record_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.header_len)
    }

    /// Build `header || document[start..end] || trailer`
    pub fn reconstruct(
        &mut self,
        document: &[u8],
        sequence: u64,
        start: usize,
        end: usize,
        trailer: &[u8],
    ) -> Result<&[u8]> {
        let span_error = || ExtractError::Span {
            role: "record",
            start,
            end,
            document_len: document.len(),
        };

        let record: &[u8] = if start == end {
            &self.open_tag
        } else {
            document.get(start..end).ok_or_else(span_error)?
        };

        let record_len = record.len();
        if record_len > self.record_capacity() {
            return Err(ExtractError::RecordTooLarge {
                sequence,
                start,
                end,
                record_len,
                header_len: self.header_len,
                capacity: self.capacity,
            });
        }

        self.bytes.truncate(self.header_len);
        self.bytes.extend_from_slice(record);
        self.bytes.extend_from_slice(trailer);
        Ok(&self.bytes)
    }

    /// Drop the active record, keeping the header
    pub fn clear(&mut self) {
        self.bytes.truncate(self.header_len);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
