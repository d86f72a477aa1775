//! Progress notifications
//!
//! Observers are advisory: they see the sequence number of every
//! `progress_unit`-th ingested record and cannot influence the run.

/// Receives periodic progress notifications
pub trait ProgressObserver {
    fn on_progress(&mut self, sequence: u64);
}

/// Logs progress through `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, sequence: u64) {
        tracing::info!(records = sequence, "{sequence} records ingested");
    }
}

/// Discards progress notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _sequence: u64) {}
}

impl<F: FnMut(u64)> ProgressObserver for F {
    fn on_progress(&mut self, sequence: u64) {
        self(sequence)
    }
}
