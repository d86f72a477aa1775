//! Error types for extraction runs.
//!
//! Every error is fatal to the run that raised it. Records already handed
//! to the sink stay ingested; nothing is rolled back. Each variant carries
//! the offsets, lengths and sequence number needed to diagnose the failure
//! without re-running.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::encoding::EncodingError;
use crate::core::SyntaxError;

/// Boxed error returned by sink implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate
pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

/// Sink lifecycle step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStage {
    Connect,
    Ingest { sequence: u64 },
    Disconnect,
}

impl fmt::Display for SinkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkStage::Connect => f.write_str("connect"),
            SinkStage::Ingest { sequence } => write!(f, "ingest of record {sequence}"),
            SinkStage::Disconnect => f.write_str("disconnect"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The header region is missing, inverted or larger than the buffer.
    #[error("header capture failed: {reason} (root start {root_start:?}, header end {header_end}, capacity {capacity})")]
    Capture {
        reason: String,
        root_start: Option<usize>,
        header_end: usize,
        capacity: usize,
    },

    /// A record closed while the run was still waiting for the header.
    #[error("record {sequence} closed at byte {offset} before the <{header}> header was captured")]
    Ordering {
        sequence: u64,
        header: String,
        offset: usize,
    },

    /// A record element opened before the enclosing record closed.
    #[error("record element opened at byte {offset} inside record {sequence}")]
    NestedRecord { sequence: u64, offset: usize },

    /// Header plus record does not fit the output buffer.
    #[error(
        "record {sequence} spans bytes {start}..{end} ({record_len} bytes); \
         with the {header_len}-byte header it exceeds the {capacity}-byte buffer"
    )]
    RecordTooLarge {
        sequence: u64,
        start: usize,
        end: usize,
        record_len: usize,
        header_len: usize,
        capacity: usize,
    },

    /// Label text does not fit the label buffer.
    #[error("label of record {sequence} at byte {offset} is {len} bytes, the label buffer holds {capacity}")]
    LabelTooLong {
        sequence: u64,
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Tracked offsets do not describe a slice of the document.
    #[error("invalid {role} span {start}..{end} in a {document_len}-byte document")]
    Span {
        role: &'static str,
        start: usize,
        end: usize,
        document_len: usize,
    },

    /// The sink rejected a lifecycle call or a record.
    #[error("sink {stage} failed: {source}")]
    Sink {
        stage: SinkStage,
        #[source]
        source: BoxError,
    },

    /// The document is not well-formed XML.
    #[error("cannot parse {name}: {source}")]
    Source {
        name: String,
        #[source]
        source: SyntaxError,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is {size} bytes, larger than the {limit}-byte document limit")]
    DocumentTooLarge { name: String, size: u64, limit: u64 },

    #[error("cannot decode {name}: {source}")]
    Encoding {
        name: String,
        #[source]
        source: EncodingError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl ExtractError {
    /// Short stable name for logs and exit reporting
    pub fn category(&self) -> &'static str {
        match self {
            ExtractError::Capture { .. } => "capture",
            ExtractError::Ordering { .. } | ExtractError::NestedRecord { .. } | ExtractError::Span { .. } => "ordering",
            ExtractError::RecordTooLarge { .. } => "record_too_large",
            ExtractError::LabelTooLong { .. } => "label_too_long",
            ExtractError::Sink { .. } => "sink",
            ExtractError::Source { .. } => "source",
            ExtractError::Io { .. } | ExtractError::DocumentTooLarge { .. } | ExtractError::Encoding { .. } => "input",
            ExtractError::Config(_) | ExtractError::ConfigParse(_) => "config",
        }
    }

    pub(crate) fn sink(stage: SinkStage, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ExtractError::Sink {
            stage,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_too_large_message_has_context() {
        let err = ExtractError::RecordTooLarge {
            sequence: 7,
            start: 100,
            end: 400,
            record_len: 300,
            header_len: 50,
            capacity: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("record 7"));
        assert!(msg.contains("100..400"));
        assert!(msg.contains("256-byte buffer"));
        assert_eq!(err.category(), "record_too_large");
    }

    #[test]
    fn test_sink_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = ExtractError::sink(SinkStage::Ingest { sequence: 3 }, io);
        assert_eq!(err.to_string(), "sink ingest of record 3 failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_source_error_names_input() {
        let err = ExtractError::Source {
            name: "dump.xml".to_string(),
            source: SyntaxError::new("unclosed element <page>", 42),
        };
        assert_eq!(
            err.to_string(),
            "cannot parse dump.xml: unclosed element <page> at byte 42"
        );
    }
}
