//! Offset Tracker
//!
//! Records the byte offsets reported by the event source for the four
//! element roles. Starts are tracked for root, header, record and label;
//! ends for header, record and label. A later event for the same role
//! overwrites the previous offset.
//!
//! The header start is only used to recognize a self-closing header,
//! whose start and end offsets coincide.

use crate::config::ElementNames;

/// Roles matched by a start event
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    pub root: bool,
    pub header: bool,
    pub record: bool,
    pub label: bool,
}

/// Roles matched by an end event
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    pub header: bool,
    pub record: bool,
    pub label: bool,
}

#[derive(Debug)]
pub struct OffsetTracker<'n> {
    names: &'n ElementNames,
    root_start: Option<usize>,
    header_start: Option<usize>,
    header_end: Option<usize>,
    record_start: Option<usize>,
    record_end: Option<usize>,
    label_start: Option<usize>,
    label_end: Option<usize>,
}

impl<'n> OffsetTracker<'n> {
    pub fn new(names: &'n ElementNames) -> Self {
        Self {
            names,
            root_start: None,
            header_start: None,
            header_end: None,
            record_start: None,
            record_end: None,
            label_start: None,
            label_end: None,
        }
    }

    pub fn on_start(&mut self, name: &[u8], offset: usize) -> Opened {
        let opened = Opened {
            root: name == self.names.root.as_bytes(),
            header: name == self.names.header.as_bytes(),
            record: name == self.names.record.as_bytes(),
            label: name == self.names.label.as_bytes(),
        };
        if opened.root {
            self.root_start = Some(offset);
        }
        if opened.header {
            self.header_start = Some(offset);
        }
        if opened.record {
            self.record_start = Some(offset);
        }
        if opened.label {
            self.label_start = Some(offset);
        }
        opened
    }

    pub fn on_end(&mut self, name: &[u8], offset: usize) -> Closed {
        let closed = Closed {
            header: name == self.names.header.as_bytes(),
            record: name == self.names.record.as_bytes(),
            label: name == self.names.label.as_bytes(),
        };
        if closed.header {
            self.header_end = Some(offset);
        }
        if closed.record {
            self.record_end = Some(offset);
        }
        if closed.label {
            self.label_end = Some(offset);
        }
        closed
    }

    pub fn root_start(&self) -> Option<usize> {
        self.root_start
    }

    pub fn header_start(&self) -> Option<usize> {
        self.header_start
    }

    pub fn header_end(&self) -> Option<usize> {
        self.header_end
    }

    pub fn record_start(&self) -> Option<usize> {
        self.record_start
    }

    /// Start and end of the most recently closed record
    pub fn record_span(&self) -> Option<(usize, usize)> {
        Some((self.record_start?, self.record_end?))
    }

    /// Start and end of the most recently closed label
    pub fn label_span(&self) -> Option<(usize, usize)> {
        Some((self.label_start?, self.label_end?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> ElementNames {
        ElementNames::new("doc", "meta", "rec", "id")
    }

    #[test]
    fn test_start_roles() {
        let names = names();
        let mut tracker = OffsetTracker::new(&names);

        assert!(tracker.on_start(b"doc", 0).root);
        assert!(tracker.on_start(b"meta", 5).header);
        assert_eq!(tracker.on_start(b"body", 9), Opened::default());
        assert!(tracker.on_start(b"rec", 20).record);
        assert!(tracker.on_start(b"id", 25).label);

        assert_eq!(tracker.root_start(), Some(0));
        assert_eq!(tracker.record_start(), Some(20));
        assert_eq!(tracker.header_start(), Some(5));
        assert_eq!(tracker.header_end(), None);
    }

    #[test]
    fn test_end_roles() {
        let names = names();
        let mut tracker = OffsetTracker::new(&names);

        assert!(tracker.on_end(b"meta", 12).header);
        assert_eq!(tracker.on_end(b"doc", 99), Closed::default());
        tracker.on_start(b"id", 30);
        assert!(tracker.on_end(b"id", 40).label);
        tracker.on_start(b"rec", 25);
        assert!(tracker.on_end(b"rec", 60).record);

        assert_eq!(tracker.header_end(), Some(12));
        assert_eq!(tracker.label_span(), Some((30, 40)));
        assert_eq!(tracker.record_span(), Some((25, 60)));
    }

    #[test]
    fn test_unrelated_names_are_no_ops() {
        let names = names();
        let mut tracker = OffsetTracker::new(&names);
        tracker.on_start(b"body", 3);
        tracker.on_end(b"body", 9);
        tracker.on_start(b"", 10);

        assert_eq!(tracker.root_start(), None);
        assert_eq!(tracker.record_span(), None);
        assert_eq!(tracker.label_span(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let names = names();
        let mut tracker = OffsetTracker::new(&names);
        tracker.on_start(b"id", 10);
        tracker.on_end(b"id", 15);
        tracker.on_start(b"id", 20);
        tracker.on_end(b"id", 28);
        assert_eq!(tracker.label_span(), Some((20, 28)));
    }
}
