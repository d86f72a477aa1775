//! Record sinks
//!
//! A [`Sink`] receives each reconstructed record synchronously, in
//! document order. The extraction driver connects before scanning starts
//! and disconnects once scanning ends, whether or not the run succeeded.

use std::convert::Infallible;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Destination for reconstructed records
pub trait Sink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn connect(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Store one record. `document` is only valid for the duration of the call.
    fn ingest(&mut self, sequence: u64, label: &str, document: &[u8]) -> Result<(), Self::Error>;

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    type Error = S::Error;

    fn connect(&mut self) -> Result<(), Self::Error> {
        (**self).connect()
    }

    fn ingest(&mut self, sequence: u64, label: &str, document: &[u8]) -> Result<(), Self::Error> {
        (**self).ingest(sequence, label, document)
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        (**self).disconnect()
    }
}

/// A record as handed to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedRecord {
    pub sequence: u64,
    pub label: String,
    pub document: Vec<u8>,
}

impl IngestedRecord {
    pub fn document_str(&self) -> &str {
        std::str::from_utf8(&self.document).unwrap_or("<invalid utf-8>")
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<IngestedRecord>,
    pub connects: usize,
    pub disconnects: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for MemorySink {
    type Error = Infallible;

    fn connect(&mut self) -> Result<(), Infallible> {
        self.connects += 1;
        Ok(())
    }

    fn ingest(&mut self, sequence: u64, label: &str, document: &[u8]) -> Result<(), Infallible> {
        self.records.push(IngestedRecord {
            sequence,
            label: label.to_string(),
            document: document.to_vec(),
        });
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Infallible> {
        self.disconnects += 1;
        Ok(())
    }
}

/// Counts records and bytes without storing anything
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingSink {
    pub records: u64,
    pub bytes: u64,
    pub largest: usize,
}

impl Sink for CountingSink {
    type Error = Infallible;

    fn ingest(&mut self, _sequence: u64, _label: &str, document: &[u8]) -> Result<(), Infallible> {
        self.records += 1;
        self.bytes += document.len() as u64;
        self.largest = self.largest.max(document.len());
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct SinkIoError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Writes each record to `<dir>/<sequence>.xml` and indexes labels in
/// `<dir>/labels.tsv` as `sequence<TAB>label` lines
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    index: Option<BufWriter<File>>,
}

impl DirectorySink {
    pub const INDEX_FILE: &'static str = "labels.tsv";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("{sequence:08}.xml"))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(Self::INDEX_FILE)
    }
}

fn io_error(path: PathBuf) -> impl FnOnce(std::io::Error) -> SinkIoError {
    move |source| SinkIoError { path, source }
}

impl Sink for DirectorySink {
    type Error = SinkIoError;

    fn connect(&mut self) -> Result<(), SinkIoError> {
        fs::create_dir_all(&self.dir).map_err(io_error(self.dir.clone()))?;
        let path = self.index_path();
        let file = File::create(&path).map_err(io_error(path))?;
        self.index = Some(BufWriter::new(file));
        Ok(())
    }

    fn ingest(&mut self, sequence: u64, label: &str, document: &[u8]) -> Result<(), SinkIoError> {
        let path = self.record_path(sequence);
        fs::write(&path, document).map_err(io_error(path))?;

        let index_path = self.index_path();
        let index = self.index.as_mut().ok_or_else(|| SinkIoError {
            path: index_path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotConnected, "sink is not connected"),
        })?;
        // Tabs and newlines would break the TSV layout
        let label: String = label
            .chars()
            .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
            .collect();
        writeln!(index, "{sequence}\t{label}").map_err(io_error(index_path))
    }

    fn disconnect(&mut self) -> Result<(), SinkIoError> {
        match self.index.take() {
            Some(mut index) => index.flush().map_err(io_error(self.index_path())),
            None => Ok(()),
        }
    }
}
