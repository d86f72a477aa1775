//! Extraction Driver
//!
//! Runs one scan over the document, routes element events through the
//! offset tracker, captures the header once, reconstructs every record and
//! hands it to the sink.
//!
//! ```text
//! Idle -> Connected -> AwaitingHeader -> ExtractingRecord -> Completed
//!                            |                  |
//!                            +------------------+--------> Failed
//! ```

use std::borrow::Cow;

use tracing::{debug, info, warn};

use super::header;
use super::label::LabelBuffer;
use super::record::OutputBuffer;
use super::tracker::OffsetTracker;
use crate::config::ExtractConfig;
use crate::core::{Attribute, EventScanner, ScanHandler, SyntaxError};
use crate::document::{Document, MEMORY_SOURCE};
use crate::error::{ExtractError, Result, SinkStage};
use crate::progress::{LogProgress, ProgressObserver};
use crate::sink::Sink;

/// Lifecycle of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Connected,
    /// Scanning, header element not closed yet
    AwaitingHeader,
    /// Scanning, header captured
    ExtractingRecord,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_scanning(self) -> bool {
        matches!(self, RunState::AwaitingHeader | RunState::ExtractingRecord)
    }
}

/// Configured extraction pipeline owning its sink and progress observer
pub struct Extractor<S, P = LogProgress> {
    config: ExtractConfig,
    sink: S,
    progress: P,
    state: RunState,
}

impl<S: Sink> Extractor<S, LogProgress> {
    pub fn new(config: ExtractConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            progress: LogProgress,
            state: RunState::Idle,
        }
    }
}

impl<S: Sink, P: ProgressObserver> Extractor<S, P> {
    pub fn with_progress<Q: ProgressObserver>(self, progress: Q) -> Extractor<S, Q> {
        Extractor {
            config: self.config,
            sink: self.sink,
            progress,
            state: self.state,
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// State reached by the most recent run
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Extract every record from an in-memory document
    ///
    /// Returns the number of records ingested. The bytes must be UTF-8; a
    /// leading BOM is tolerated and never copied into a record. Use
    /// [`Document`] for UTF-16 input.
    pub fn extract(&mut self, document: &[u8]) -> Result<usize> {
        self.run(MEMORY_SOURCE, document)
    }

    pub fn extract_document(&mut self, document: &Document) -> Result<usize> {
        self.run(document.name(), document.as_bytes())
    }

    fn run(&mut self, name: &str, document: &[u8]) -> Result<usize> {
        self.state = RunState::Idle;
        if let Err(e) = self.config.validate() {
            self.state = RunState::Failed;
            return Err(e);
        }

        if let Err(source) = self.sink.connect() {
            self.state = RunState::Failed;
            return Err(ExtractError::sink(SinkStage::Connect, source));
        }
        self.state = RunState::Connected;
        debug!(source = name, bytes = document.len(), "connected, scanning");

        let (scanned, ingested, reached) = {
            let mut cx = ExtractionContext::new(&self.config, document, &mut self.sink, &mut self.progress);
            let scanned = EventScanner::new(document).scan(&mut cx);
            (scanned, cx.ingested, cx.state)
        };

        let scanned = scanned.map_err(|e| match e {
            RunError::Syntax(source) => ExtractError::Source {
                name: name.to_string(),
                source,
            },
            RunError::Extract(e) => e,
        });
        let disconnected = self.sink.disconnect();

        match scanned {
            Ok(()) => {
                if let Err(source) = disconnected {
                    self.state = RunState::Failed;
                    return Err(ExtractError::sink(SinkStage::Disconnect, source));
                }
                if reached == RunState::AwaitingHeader {
                    debug!(header = %self.config.elements.header, "document ended without a header");
                }
                self.state = RunState::Completed;
                info!(source = name, records = ingested, "extraction complete");
                Ok(ingested)
            }
            Err(e) => {
                if let Err(d) = disconnected {
                    warn!(error = %d, "disconnect failed after aborted run");
                }
                self.state = RunState::Failed;
                warn!(source = name, records = ingested, category = e.category(), "extraction aborted");
                Err(e)
            }
        }
    }
}

/// Extract with default element names and the given buffer capacity
pub fn extract<S: Sink>(document: &[u8], max_buffer_capacity: usize, sink: S) -> Result<usize> {
    let config = ExtractConfig::default().with_max_buffer_capacity(max_buffer_capacity);
    Extractor::new(config, sink).extract(document)
}

enum RunError {
    Syntax(SyntaxError),
    Extract(ExtractError),
}

impl From<SyntaxError> for RunError {
    fn from(e: SyntaxError) -> Self {
        RunError::Syntax(e)
    }
}

impl From<ExtractError> for RunError {
    fn from(e: ExtractError) -> Self {
        RunError::Extract(e)
    }
}

/// All mutable state of one run, borrowed by the scanner callbacks
struct ExtractionContext<'r, S, P> {
    config: &'r ExtractConfig,
    document: &'r [u8],
    sink: &'r mut S,
    progress: &'r mut P,
    tracker: OffsetTracker<'r>,
    /// Present once the header has been captured
    output: Option<OutputBuffer>,
    label: LabelBuffer,
    suffix: String,
    trailer: String,
    /// Sequence number of the most recently opened record
    sequence: u64,
    /// A record element is open and not yet closed
    in_record: bool,
    ingested: usize,
    state: RunState,
}

impl<'r, S: Sink, P: ProgressObserver> ExtractionContext<'r, S, P> {
    fn new(config: &'r ExtractConfig, document: &'r [u8], sink: &'r mut S, progress: &'r mut P) -> Self {
        Self {
            config,
            document,
            sink,
            progress,
            tracker: OffsetTracker::new(&config.elements),
            output: None,
            label: LabelBuffer::new(&config.elements.label, config.label_capacity),
            suffix: config.header_suffix(),
            trailer: config.record_trailer(),
            sequence: 0,
            in_record: false,
            ingested: 0,
            state: RunState::AwaitingHeader,
        }
    }

    fn on_header_end(&mut self, offset: usize) -> Result<()> {
        if self.state != RunState::AwaitingHeader {
            debug!(offset, "ignoring repeated <{}> end", self.config.elements.header);
            return Ok(());
        }

        let capacity = self.config.max_buffer_capacity;
        let suffix: Cow<'_, str> = if self.tracker.header_start() == Some(offset) {
            // Self-closing header: reopen it so the suffix has something to close
            Cow::Owned(format!("<{}>{}", self.config.elements.header, self.suffix))
        } else {
            Cow::Borrowed(self.suffix.as_str())
        };
        let header = header::capture(
            self.document,
            self.tracker.root_start(),
            offset,
            suffix.as_bytes(),
            capacity,
            self.trailer.len(),
        )?;

        debug!(header_len = header.len(), "captured header");
        self.output = Some(OutputBuffer::new(header, capacity, &self.config.elements.record));
        self.state = RunState::ExtractingRecord;
        Ok(())
    }

    fn on_record_start(&mut self, offset: usize) -> Result<()> {
        if self.in_record {
            return Err(ExtractError::NestedRecord {
                sequence: self.sequence,
                offset,
            });
        }
        self.in_record = true;
        self.sequence += 1;
        Ok(())
    }

    fn on_record_end(&mut self, offset: usize) -> Result<()> {
        self.in_record = false;
        let sequence = self.sequence;
        let ordering = || ExtractError::Ordering {
            sequence,
            header: self.config.elements.header.clone(),
            offset,
        };

        let output = match (self.state, self.output.as_mut()) {
            (RunState::ExtractingRecord, Some(output)) => output,
            _ => return Err(ordering()),
        };
        let start = self.tracker.record_start().ok_or_else(ordering)?;

        let ingested = match output.reconstruct(self.document, sequence, start, offset, self.trailer.as_bytes()) {
            Ok(document) => {
                let label: Cow<'_, str> = self.label.text();
                debug!(sequence, label = %label, bytes = document.len(), "ingesting record");
                self.sink.ingest(sequence, &label, document)
            }
            Err(e) => {
                self.label.clear();
                return Err(e);
            }
        };

        // Cleared before the result is inspected so a failed record leaves nothing behind
        output.clear();
        self.label.clear();
        ingested.map_err(|source| ExtractError::sink(SinkStage::Ingest { sequence }, source))?;

        self.ingested += 1;
        let unit = self.config.progress_unit;
        if unit > 0 && sequence % unit == 0 {
            self.progress.on_progress(sequence);
        }
        Ok(())
    }

    fn on_label_end(&mut self) -> Result<()> {
        match self.tracker.label_span() {
            Some((start, end)) => self.label.capture(self.document, self.sequence, start, end),
            None => Ok(()),
        }
    }

    fn dispatch_start(&mut self, name: &[u8], offset: usize) -> Result<()> {
        if self.tracker.on_start(name, offset).record {
            self.on_record_start(offset)?;
        }
        Ok(())
    }

    fn dispatch_end(&mut self, name: &[u8], offset: usize) -> Result<()> {
        let closed = self.tracker.on_end(name, offset);
        if closed.header {
            self.on_header_end(offset)?;
        }
        if closed.record {
            self.on_record_end(offset)?;
        }
        if closed.label {
            self.on_label_end()?;
        }
        Ok(())
    }
}

impl<S: Sink, P: ProgressObserver> ScanHandler for ExtractionContext<'_, S, P> {
    type Error = RunError;

    fn start_element(&mut self, name: &[u8], _attrs: &[Attribute<'_>], offset: usize) -> Result<(), RunError> {
        if !self.state.is_scanning() {
            return Ok(());
        }
        self.dispatch_start(name, offset).map_err(|e| {
            self.state = RunState::Failed;
            RunError::from(e)
        })
    }

    fn end_element(&mut self, name: &[u8], offset: usize) -> Result<(), RunError> {
        if !self.state.is_scanning() {
            return Ok(());
        }
        self.dispatch_end(name, offset).map_err(|e| {
            self.state = RunState::Failed;
            RunError::from(e)
        })
    }
}
