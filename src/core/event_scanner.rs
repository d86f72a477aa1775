//! Event Scanner with ScanHandler Trait
//!
//! Walks an in-memory XML document once, front to back, and reports
//! element starts and ends to a [`ScanHandler`] together with the byte
//! offset of the tag's opening `<`. Self-closing tags are reported as a
//! start immediately followed by an end at the same offset.
//!
//! The scanner checks the structural rules an extraction run depends on:
//! - start and end tags balance and match by name
//! - exactly one root element, no character data outside it
//! - comments, CDATA sections, PIs and tags are terminated
//! - attributes are `name="value"` pairs without duplicates
//!
//! It does not decode entities, resolve namespaces or validate against a DTD.

use std::borrow::Cow;

use thiserror::Error;

use super::scanner::{is_name_start_char, Scanner};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Attribute as (name, raw value) slices of the input
pub type Attribute<'a> = (&'a [u8], &'a [u8]);

/// A structural error found while scanning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {position}")]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        SyntaxError {
            message: message.into(),
            position,
        }
    }
}

/// Receiver for scan events
///
/// `offset` is the scanner's current byte index when the event fires,
/// which is always the position of the `<` that opens the tag. Returning
/// an error stops the scan and the error is handed back from
/// [`EventScanner::scan`] unchanged.
pub trait ScanHandler {
    type Error: From<SyntaxError>;

    /// Called when an element starts
    fn start_element(
        &mut self,
        name: &[u8],
        attrs: &[Attribute<'_>],
        offset: usize,
    ) -> Result<(), Self::Error>;

    /// Called when an element ends
    fn end_element(&mut self, name: &[u8], offset: usize) -> Result<(), Self::Error>;
}

/// Single-pass scanner dispatching to a [`ScanHandler`]
pub struct EventScanner<'a> {
    scanner: Scanner<'a>,
    /// Reusable attribute buffer to avoid per-element allocations
    attrs_buf: Vec<Attribute<'a>>,
    /// Names of currently open elements, innermost last
    open: Vec<&'a [u8]>,
    seen_root: bool,
}

impl<'a> EventScanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            scanner: Scanner::new(input),
            attrs_buf: Vec::with_capacity(8),
            open: Vec::with_capacity(32),
            seen_root: false,
        }
    }

    /// Scan the entire document
    ///
    /// A leading UTF-8 BOM is skipped. Offsets still count it, so they
    /// remain valid indices into the caller's slice. Input that did not
    /// pass through `Document` (raw bytes given to `Extractor::extract`)
    /// may carry one.
    pub fn scan<H: ScanHandler>(&mut self, handler: &mut H) -> Result<(), H::Error> {
        if self.scanner.position() == 0 && self.scanner.starts_with(UTF8_BOM) {
            self.scanner.advance(UTF8_BOM.len());
        }

        while let Some(c) = self.scanner.peek() {
            if c == b'<' {
                self.scan_markup(handler)?;
            } else {
                self.scan_text()?;
            }
        }

        let end = self.scanner.len();
        if let Some(name) = self.open.last() {
            return Err(SyntaxError::new(format!("unclosed element <{}>", lossy(name)), end).into());
        }
        if !self.seen_root {
            return Err(SyntaxError::new("no root element", end).into());
        }
        Ok(())
    }

    fn scan_markup<H: ScanHandler>(&mut self, handler: &mut H) -> Result<(), H::Error> {
        let start = self.scanner.position();

        match self.scanner.peek_at(1) {
            Some(b'/') => self.scan_end_tag(start, handler),
            Some(b'!') => Ok(self.scan_declaration(start)?),
            Some(b'?') => {
                self.scanner.advance(2);
                Ok(self.skip_past(b"?>", start, "unterminated processing instruction")?)
            }
            Some(c) if is_name_start_char(c) => self.scan_start_tag(start, handler),
            _ => Err(SyntaxError::new("invalid markup after '<'", start).into()),
        }
    }

    /// Comments, CDATA sections and DOCTYPE
    fn scan_declaration(&mut self, start: usize) -> Result<(), SyntaxError> {
        if self.scanner.starts_with(b"<!--") {
            self.scanner.advance(4);
            self.skip_past(b"-->", start, "unterminated comment")
        } else if self.scanner.starts_with(b"<![CDATA[") {
            if self.open.is_empty() {
                return Err(SyntaxError::new("CDATA section outside root element", start));
            }
            self.scanner.advance(9);
            self.skip_past(b"]]>", start, "unterminated CDATA section")
        } else if self.scanner.starts_with(b"<!DOCTYPE") {
            if self.seen_root {
                return Err(SyntaxError::new("DOCTYPE after root element", start));
            }
            self.scanner.advance(9);
            self.skip_doctype(start)
        } else {
            Err(SyntaxError::new("unrecognized markup declaration", start))
        }
    }

    fn scan_start_tag<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), H::Error> {
        self.scanner.advance(1);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| SyntaxError::new("invalid element name", start))?;

        if self.open.is_empty() {
            if self.seen_root {
                return Err(SyntaxError::new(
                    format!("element <{}> after root element", lossy(name)),
                    start,
                )
                .into());
            }
            self.seen_root = true;
        }

        self.attrs_buf.clear();
        loop {
            let before = self.scanner.position();
            self.scanner.skip_whitespace();
            let separated = self.scanner.position() > before;

            match self.scanner.peek() {
                Some(b'>') => {
                    self.scanner.advance(1);
                    self.open.push(name);
                    return handler.start_element(name, &self.attrs_buf, start);
                }
                Some(b'/') if self.scanner.peek_at(1) == Some(b'>') => {
                    self.scanner.advance(2);
                    handler.start_element(name, &self.attrs_buf, start)?;
                    return handler.end_element(name, start);
                }
                Some(c) if separated && is_name_start_char(c) => {
                    let attr = self.scan_attribute(start)?;
                    if self.attrs_buf.iter().any(|(n, _)| *n == attr.0) {
                        return Err(SyntaxError::new(
                            format!("duplicate attribute {}", lossy(attr.0)),
                            start,
                        )
                        .into());
                    }
                    self.attrs_buf.push(attr);
                }
                Some(_) => {
                    return Err(SyntaxError::new(
                        format!("malformed start tag <{}>", lossy(name)),
                        self.scanner.position(),
                    )
                    .into())
                }
                None => return Err(SyntaxError::new("unterminated start tag", start).into()),
            }
        }
    }

    fn scan_attribute(&mut self, tag_start: usize) -> Result<Attribute<'a>, SyntaxError> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| SyntaxError::new("invalid attribute name", self.scanner.position()))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            return Err(SyntaxError::new(
                format!("expected '=' after attribute {}", lossy(name)),
                self.scanner.position(),
            ));
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let quote = match self.scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(SyntaxError::new(
                    format!("value of attribute {} must be quoted", lossy(name)),
                    self.scanner.position(),
                ))
            }
        };
        self.scanner.advance(1);

        let value_start = self.scanner.position();
        let value_end = self
            .scanner
            .find_byte(quote)
            .ok_or_else(|| SyntaxError::new("unterminated attribute value", tag_start))?;
        let value = self.scanner.slice(value_start, value_end);
        if let Some(i) = memchr::memchr(b'<', value) {
            return Err(SyntaxError::new("'<' in attribute value", value_start + i));
        }
        self.scanner.set_position(value_end + 1);

        Ok((name, value))
    }

    fn scan_end_tag<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), H::Error> {
        self.scanner.advance(2);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| SyntaxError::new("invalid end tag name", start))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(SyntaxError::new(
                format!("malformed end tag </{}>", lossy(name)),
                self.scanner.position(),
            )
            .into());
        }
        self.scanner.advance(1);

        match self.open.pop() {
            Some(open) if open == name => handler.end_element(name, start),
            Some(open) => Err(SyntaxError::new(
                format!("mismatched end tag </{}>, expected </{}>", lossy(name), lossy(open)),
                start,
            )
            .into()),
            None => Err(SyntaxError::new(format!("unexpected end tag </{}>", lossy(name)), start).into()),
        }
    }

    /// Character data runs to the next '<'; outside the root it must be whitespace
    fn scan_text(&mut self) -> Result<(), SyntaxError> {
        let start = self.scanner.position();
        let end = self.scanner.find_byte(b'<').unwrap_or(self.scanner.len());

        if self.open.is_empty() {
            let text = self.scanner.slice(start, end);
            if let Some(i) = text
                .iter()
                .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
            {
                return Err(SyntaxError::new("text outside root element", start + i));
            }
        }

        self.scanner.set_position(end);
        Ok(())
    }

    fn skip_doctype(&mut self, start: usize) -> Result<(), SyntaxError> {
        // Internal subset brackets may contain '>'
        let mut depth = 0usize;
        while let Some(c) = self.scanner.peek() {
            self.scanner.advance(1);
            match c {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(SyntaxError::new("unterminated DOCTYPE", start))
    }

    fn skip_past(&mut self, terminator: &[u8], start: usize, message: &str) -> Result<(), SyntaxError> {
        match self.scanner.find_sequence(terminator) {
            Some(pos) => {
                self.scanner.set_position(pos + terminator.len());
                Ok(())
            }
            None => Err(SyntaxError::new(message, start)),
        }
    }
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
