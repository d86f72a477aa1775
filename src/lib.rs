//! xmlsplit - split large XML exports into self-contained documents
//!
//! A single pass over the input finds the shared header and every record
//! element. Each record is rebuilt as `root start .. header end`, followed by
//! the record and the closing tags, then handed to a [`Sink`] together with
//! its label text and a 1-based sequence number.
//!
//! ```no_run
//! use xmlsplit::{ExtractConfig, Extractor, MemorySink};
//!
//! let input = std::fs::read("dump.xml")?;
//! let mut extractor = Extractor::new(ExtractConfig::default(), MemorySink::new());
//! let count = extractor.extract(&input)?;
//! println!("{count} pages, first titled {:?}", extractor.sink().records[0].label);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod document;
pub mod error;
pub mod extract;
pub mod memory;
pub mod progress;
pub mod sink;

pub use config::{ElementNames, ExtractConfig};
pub use document::Document;
pub use error::{ExtractError, Result, SinkStage};
pub use extract::{extract, Extractor, RunState};
pub use memory::MemoryStats;
pub use progress::{LogProgress, NoProgress, ProgressObserver};
pub use sink::{CountingSink, DirectorySink, IngestedRecord, MemorySink, Sink};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: memory::tracking::TrackingAllocator = memory::tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
