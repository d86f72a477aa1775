//! Core XML scanning primitives
//!
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - EventScanner: single-pass element start/end events with byte offsets
//! - Encoding: BOM handling and UTF-16 to UTF-8 conversion at load time

pub mod encoding;
pub mod event_scanner;
pub mod scanner;

pub use event_scanner::{Attribute, EventScanner, ScanHandler, SyntaxError};
