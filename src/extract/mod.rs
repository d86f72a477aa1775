//! Streaming Record Extraction
//!
//! ```text
//! EventScanner ---> OffsetTracker ---> header::capture (once)
//!                        |
//!                        +---> LabelBuffer (per label)
//!                        +---> OutputBuffer::reconstruct (per record) ---> Sink
//! ```
//!
//! Only byte offsets are tracked while scanning. Record text is copied
//! exactly once, into the reusable output buffer behind the header.

pub mod driver;
pub mod header;
pub mod label;
pub mod record;
pub mod tracker;

pub use driver::{extract, Extractor, RunState};
