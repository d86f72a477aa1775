//! Input Encoding Normalization
//!
//! Extraction works on UTF-8 bytes. Documents saved as UTF-16 (with or
//! without a BOM) are transcoded once at load time; a UTF-8 BOM is
//! dropped in place so byte offsets start at the first real character.

use thiserror::Error;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Encoding detected from the byte order mark or the first code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{encoding:?} input has an odd number of bytes ({len})")]
    OddLength { encoding: XmlEncoding, len: usize },

    #[error("{encoding:?} input contains an unpaired surrogate at code unit {index}")]
    UnpairedSurrogate { encoding: XmlEncoding, index: usize },
}

impl XmlEncoding {
    pub fn detect(input: &[u8]) -> Self {
        match input {
            [0xFF, 0xFE, ..] | [b'<', 0x00, ..] => XmlEncoding::Utf16Le,
            [0xFE, 0xFF, ..] | [0x00, b'<', ..] => XmlEncoding::Utf16Be,
            _ => XmlEncoding::Utf8,
        }
    }
}

/// Convert `input` to UTF-8 without a BOM
///
/// UTF-8 input is returned in its original allocation.
pub fn normalize(mut input: Vec<u8>) -> Result<Vec<u8>, EncodingError> {
    match XmlEncoding::detect(&input) {
        XmlEncoding::Utf8 => {
            if input.starts_with(&UTF8_BOM) {
                input.drain(..UTF8_BOM.len());
            }
            Ok(input)
        }
        XmlEncoding::Utf16Le => decode_utf16(&input, XmlEncoding::Utf16Le, [0xFF, 0xFE], u16::from_le_bytes),
        XmlEncoding::Utf16Be => decode_utf16(&input, XmlEncoding::Utf16Be, [0xFE, 0xFF], u16::from_be_bytes),
    }
}

fn decode_utf16(
    input: &[u8],
    encoding: XmlEncoding,
    bom: [u8; 2],
    to_unit: fn([u8; 2]) -> u16,
) -> Result<Vec<u8>, EncodingError> {
    let bytes = input.strip_prefix(&bom[..]).unwrap_or(input);
    if bytes.len() % 2 != 0 {
        return Err(EncodingError::OddLength {
            encoding,
            len: input.len(),
        });
    }

    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    let mut out = Vec::with_capacity(bytes.len());
    let mut buf = [0u8; 4];
    for (index, decoded) in char::decode_utf16(units).enumerate() {
        let c = decoded.map_err(|_| EncodingError::UnpairedSurrogate { encoding, index })?;
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    Ok(out)
}
