//! Extraction configuration.
//!
//! Defaults describe a MediaWiki XML dump: `<mediawiki>` root, a leading
//! `<siteinfo>` block as the shared header, one `<page>` per record and
//! the page `<title>` as its label. A TOML file may override any field:
//!
//! ```toml
//! max_buffer_capacity = 1073741824
//! progress_unit = 500
//!
//! [elements]
//! root = "doc"
//! header = "meta"
//! record = "rec"
//! label = "id"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::scanner::is_valid_name;
use crate::error::{ExtractError, Result};

/// 4 GiB, or the whole address space on targets where that does not fit
pub const DEFAULT_MAX_BUFFER_CAPACITY: usize = if usize::BITS >= 64 {
    (1u64 << 32) as usize
} else {
    usize::MAX
};

pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 1 << 32;
pub const DEFAULT_LABEL_CAPACITY: usize = 8192;
pub const DEFAULT_PROGRESS_UNIT: u64 = 100;

/// Element names driving an extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementNames {
    /// Document root, opened by the header and closed after every record
    pub root: String,
    /// Element whose end closes the shared header
    pub header: String,
    /// One extracted record per occurrence
    pub record: String,
    /// Child of the record whose text becomes the record label
    pub label: String,
}

impl Default for ElementNames {
    fn default() -> Self {
        Self {
            root: "mediawiki".to_string(),
            header: "siteinfo".to_string(),
            record: "page".to_string(),
            label: "title".to_string(),
        }
    }
}

impl ElementNames {
    pub fn new(
        root: impl Into<String>,
        header: impl Into<String>,
        record: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            header: header.into(),
            record: record.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    pub elements: ElementNames,
    /// Appended after the synthetic header closing tag
    pub header_separator: String,
    /// Written between the record closing tag and the root closing tag
    pub root_separator: String,
    /// Upper bound for header plus one record, in bytes
    pub max_buffer_capacity: usize,
    /// Largest document `Document::load` accepts, in bytes
    pub max_document_size: u64,
    /// Label buffer size in bytes
    pub label_capacity: usize,
    /// Notify the progress observer every N records; 0 disables
    pub progress_unit: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            elements: ElementNames::default(),
            header_separator: "\n  ".to_string(),
            root_separator: "\n".to_string(),
            max_buffer_capacity: DEFAULT_MAX_BUFFER_CAPACITY,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            label_capacity: DEFAULT_LABEL_CAPACITY,
            progress_unit: DEFAULT_PROGRESS_UNIT,
        }
    }
}

impl ExtractConfig {
    pub fn new(elements: ElementNames) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn with_max_buffer_capacity(mut self, capacity: usize) -> Self {
        self.max_buffer_capacity = capacity;
        self
    }

    pub fn with_label_capacity(mut self, capacity: usize) -> Self {
        self.label_capacity = capacity;
        self
    }

    pub fn with_progress_unit(mut self, unit: u64) -> Self {
        self.progress_unit = unit;
        self
    }

    pub fn with_separators(mut self, header: impl Into<String>, root: impl Into<String>) -> Self {
        self.header_separator = header.into();
        self.root_separator = root.into();
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ExtractConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject names the scanner could never report and zero-sized buffers
    pub fn validate(&self) -> Result<()> {
        let names = &self.elements;
        for (role, name) in [
            ("root", &names.root),
            ("header", &names.header),
            ("record", &names.record),
            ("label", &names.label),
        ] {
            if !is_valid_name(name.as_bytes()) {
                return Err(ExtractError::Config(format!("{role} element name {name:?} is not a valid XML name")));
            }
        }
        if names.record == names.root || names.record == names.header {
            return Err(ExtractError::Config(format!(
                "record element <{}> must differ from the root and header elements",
                names.record
            )));
        }
        if names.label == names.root || names.label == names.header || names.label == names.record {
            return Err(ExtractError::Config(format!(
                "label element <{}> must differ from the root, header and record elements",
                names.label
            )));
        }
        if self.max_buffer_capacity == 0 {
            return Err(ExtractError::Config("max_buffer_capacity must be positive".to_string()));
        }
        if self.label_capacity == 0 {
            return Err(ExtractError::Config("label_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// Bytes appended to the captured header region
    pub(crate) fn header_suffix(&self) -> String {
        format!("</{}>{}", self.elements.header, self.header_separator)
    }

    /// Bytes appended after each record
    pub(crate) fn record_trailer(&self) -> String {
        format!("</{}>{}</{}>", self.elements.record, self.root_separator, self.elements.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_mediawiki_dump() {
        let config = ExtractConfig::default();
        assert_eq!(config.elements.root, "mediawiki");
        assert_eq!(config.elements.header, "siteinfo");
        assert_eq!(config.elements.record, "page");
        assert_eq!(config.elements.label, "title");
        assert_eq!(config.label_capacity, 8192);
        assert_eq!(config.progress_unit, 100);
        assert_eq!(config.header_suffix(), "</siteinfo>\n  ");
        assert_eq!(config.record_trailer(), "</page>\n</mediawiki>");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExtractConfig::from_toml_str(
            r#"
            progress_unit = 5
            [elements]
            record = "rec"
            "#,
        )
        .unwrap();
        assert_eq!(config.progress_unit, 5);
        assert_eq!(config.elements.record, "rec");
        assert_eq!(config.elements.root, "mediawiki");
        assert_eq!(config.header_separator, "\n  ");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ExtractConfig::from_toml_str("max_bufer = 3").unwrap_err();
        assert!(matches!(err, ExtractError::ConfigParse(_)));
    }

    #[test]
    fn test_invalid_element_name_rejected() {
        let config = ExtractConfig::new(ElementNames::new("doc", "meta", "1rec", "id"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("record element name"));
    }

    #[test]
    fn test_record_must_differ_from_root() {
        let config = ExtractConfig::new(ElementNames::new("doc", "meta", "doc", "id"));
        assert!(matches!(config.validate(), Err(ExtractError::Config(_))));
    }

    #[test]
    fn test_label_must_differ_from_other_roles() {
        for label in ["doc", "meta", "rec"] {
            let config = ExtractConfig::new(ElementNames::new("doc", "meta", "rec", label));
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("label element"), "{label}: {err}");
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ExtractConfig::default().with_max_buffer_capacity(0);
        assert!(matches!(config.validate(), Err(ExtractError::Config(_))));
    }
}
