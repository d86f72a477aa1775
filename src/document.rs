//! Document loading
//!
//! The whole input is read into one buffer before extraction starts, and
//! that buffer is never modified afterwards.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::encoding;
use crate::error::{ExtractError, Result};

/// Name reported for documents that did not come from a file
pub const MEMORY_SOURCE: &str = "<memory>";

/// An immutable, fully buffered XML input
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    bytes: Vec<u8>,
}

impl Document {
    /// Wrap bytes already in memory, normalizing their encoding
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let bytes = encoding::normalize(bytes).map_err(|source| ExtractError::Encoding {
            name: name.clone(),
            source,
        })?;
        Ok(Self { name, bytes })
    }

    /// Read `path`, refusing files larger than `max_size` bytes
    pub fn load(path: &Path, max_size: u64) -> Result<Self> {
        let io_error = |source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        };
        let name = path.display().to_string();

        let file = File::open(path).map_err(io_error)?;
        let size = file.metadata().map_err(io_error)?.len();
        if size > max_size {
            return Err(ExtractError::DocumentTooLarge {
                name,
                size,
                limit: max_size,
            });
        }

        let mut bytes = Vec::with_capacity(size as usize);
        // The file may grow after metadata(); take() keeps the limit honest
        file.take(max_size.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(io_error)?;
        if bytes.len() as u64 > max_size {
            return Err(ExtractError::DocumentTooLarge {
                name,
                size: bytes.len() as u64,
                limit: max_size,
            });
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded document");
        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
