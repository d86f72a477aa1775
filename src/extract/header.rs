//! Header Capture
//!
//! The header is the document text from the root start tag up to the
//! header element's end tag, followed by a synthetic suffix that closes
//! the header element again. It is copied once and prefixed to every
//! reconstructed record.

use crate::error::{ExtractError, Result};

/// Copy `document[root_start..header_end]` and append `suffix`
///
/// The returned buffer has room reserved for the largest record that can
/// follow the header plus `trailer_len`, so record reconstruction reuses
/// it without reallocating.
pub fn capture(
    document: &[u8],
    root_start: Option<usize>,
    header_end: usize,
    suffix: &[u8],
    capacity: usize,
    trailer_len: usize,
) -> Result<Vec<u8>> {
    let fail = |reason: String| ExtractError::Capture {
        reason,
        root_start,
        header_end,
        capacity,
    };

    let start = root_start.ok_or_else(|| fail("root element was never opened".to_string()))?;
    let region_len = header_end
        .checked_sub(start)
        .ok_or_else(|| fail("header closes before the root element opens".to_string()))?;
    let region = document
        .get(start..header_end)
        .ok_or_else(|| fail(format!("header region exceeds the {}-byte document", document.len())))?;

    let header_len = region_len + suffix.len();
    if header_len > capacity {
        return Err(fail(format!("header is {header_len} bytes")));
    }

    let reserve = record_reserve(header_len, capacity, document.len()) + trailer_len;
    let mut header = Vec::with_capacity(header_len + reserve);
    header.extend_from_slice(region);
    header.extend_from_slice(suffix);
    Ok(header)
}

/// Record bytes that may follow a header of `header_len` bytes. A record
/// is a slice of the document, so it never needs more than the document.
fn record_reserve(header_len: usize, capacity: usize, document_len: usize) -> usize {
    capacity.saturating_sub(header_len).min(document_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &[u8] = b"<?xml version=\"1.0\"?>\n<doc><meta>x</meta><rec/></doc>";

    #[test]
    fn test_capture_slices_root_to_header_end() {
        // <doc> at 22, </meta> at 34
        let header = capture(DOC, Some(22), 34, b"</meta>\n", 1024, 0).unwrap();
        assert_eq!(header, b"<doc><meta>x</meta>\n");
    }

    #[test]
    fn test_capture_reserves_room() {
        let header = capture(DOC, Some(22), 34, b"</meta>", 1024, 100).unwrap();
        assert!(header.capacity() >= header.len() + 100);
    }

    #[test]
    fn test_record_reserve_excludes_header() {
        assert_eq!(record_reserve(19, 1024, 53), 53);
        assert_eq!(record_reserve(19, 30, 53), 11);
        assert_eq!(record_reserve(19, 19, 53), 0);
    }

    #[test]
    fn test_missing_root_start() {
        let err = capture(DOC, None, 34, b"</meta>", 1024, 0).unwrap_err();
        assert!(matches!(err, ExtractError::Capture { root_start: None, .. }));
    }

    #[test]
    fn test_inverted_region() {
        let err = capture(DOC, Some(40), 34, b"</meta>", 1024, 0).unwrap_err();
        assert!(err.to_string().contains("closes before the root"));
    }

    #[test]
    fn test_oversized_header() {
        // 12 region bytes + 7 suffix bytes
        assert!(capture(DOC, Some(22), 34, b"</meta>", 19, 0).is_ok());
        let err = capture(DOC, Some(22), 34, b"</meta>", 18, 0).unwrap_err();
        assert!(matches!(err, ExtractError::Capture { capacity: 18, .. }));
    }
}
