use std::fs;
use std::io::Write;

use proptest::prelude::*;
use xmlsplit::{
    DirectorySink, Document, ElementNames, ExtractConfig, ExtractError, Extractor, MemorySink, NoProgress, RunState,
};

const DUMP: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/" xml:lang="en">
  <siteinfo>
    <sitename>Wikipedia</sitename>
    <namespaces>
      <namespace key="0" case="first-letter" />
    </namespaces>
  </siteinfo>
  <page>
    <title>Alpha</title>
    <id>1</id>
    <revision><text xml:space="preserve">first &amp; only</text></revision>
  </page>
  <page>
    <title>Beta &amp; Gamma</title>
    <id>2</id>
    <revision><text><![CDATA[<not a tag>]]></text></revision>
  </page>
  <page>
    <id>3</id>
  </page>
</mediawiki>
"#;

fn header() -> String {
    let start = DUMP.find("<mediawiki").unwrap();
    let end = DUMP.find("</siteinfo>").unwrap();
    format!("{}</siteinfo>\n  ", &DUMP[start..end])
}

fn page(n: usize) -> &'static str {
    let mut rest = DUMP;
    for _ in 0..n {
        let at = rest.find("</page>").unwrap();
        rest = &rest[at + "</page>".len()..];
    }
    let start = rest.find("<page>").unwrap();
    let end = rest.find("</page>").unwrap();
    &rest[start..end]
}

#[test]
fn splits_mediawiki_dump_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DUMP.as_bytes()).unwrap();
    let out = tempfile::tempdir().unwrap();

    let document = Document::load(file.path(), 1 << 20).unwrap();
    let mut extractor =
        Extractor::new(ExtractConfig::default(), DirectorySink::new(out.path())).with_progress(NoProgress);
    assert_eq!(extractor.extract_document(&document).unwrap(), 3);
    assert_eq!(extractor.state(), RunState::Completed);

    for (n, sequence) in [(0, 1), (1, 2), (2, 3)] {
        let written = fs::read_to_string(out.path().join(format!("{sequence:08}.xml"))).unwrap();
        assert_eq!(written, format!("{}{}</page>\n</mediawiki>", header(), page(n)));
    }

    // Labels are raw bytes between the tags, entities untouched
    let index = fs::read_to_string(out.path().join(DirectorySink::INDEX_FILE)).unwrap();
    assert_eq!(index, "1\tAlpha\n2\tBeta &amp; Gamma\n3\t\n");
}

#[test]
fn every_output_is_itself_splittable() {
    let mut first = MemorySink::new();
    xmlsplit::extract(DUMP.as_bytes(), 1 << 20, &mut first).unwrap();

    for record in &first.records {
        let mut again = MemorySink::new();
        let count = xmlsplit::extract(&record.document, 1 << 20, &mut again).unwrap();
        assert_eq!(count, 1);
        assert_eq!(again.records[0].document, record.document);
        assert_eq!(again.records[0].label, record.label);
    }
}

#[test]
fn config_file_drives_element_names() {
    let config = ExtractConfig::from_toml_str(
        r#"
        header_separator = ""
        root_separator = ""
        progress_unit = 0

        [elements]
        root = "catalog"
        header = "info"
        record = "book"
        label = "isbn"
        "#,
    )
    .unwrap();
    let input = b"<catalog><info>v1</info><book><isbn>111</isbn></book><book><isbn>222</isbn></book></catalog>";

    let mut extractor = Extractor::new(config, MemorySink::new());
    assert_eq!(extractor.extract(input).unwrap(), 2);
    let record = &extractor.sink().records[1];
    assert_eq!(record.label, "222");
    assert_eq!(
        record.document_str(),
        "<catalog><info>v1</info><book><isbn>222</isbn></book></catalog>"
    );
}

#[test]
fn utf16_input_is_normalized_before_scanning() {
    let text = "<doc><meta>é</meta><rec><id>ü</id></rec></doc>";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let document = Document::from_bytes("utf16.xml", bytes).unwrap();

    let config = ExtractConfig::new(ElementNames::new("doc", "meta", "rec", "id")).with_separators("", "");
    let mut extractor = Extractor::new(config, MemorySink::new()).with_progress(NoProgress);
    assert_eq!(extractor.extract_document(&document).unwrap(), 1);
    assert_eq!(extractor.sink().records[0].label, "ü");
    assert_eq!(extractor.sink().records[0].document_str(), text);
}

#[test]
fn truncated_file_reports_source_name() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&DUMP.as_bytes()[..DUMP.len() / 2]).unwrap();

    let document = Document::load(file.path(), 1 << 20).unwrap();
    let mut extractor = Extractor::new(ExtractConfig::default(), MemorySink::new()).with_progress(NoProgress);
    match extractor.extract_document(&document) {
        Err(ExtractError::Source { name, .. }) => assert_eq!(name, document.name()),
        other => panic!("expected source error, got {:?}", other),
    }
}

fn build_document(bodies: &[String]) -> String {
    let mut doc = String::from("<r><h>head</h>");
    for (i, body) in bodies.iter().enumerate() {
        doc.push_str(&format!("<p><t>label{i}</t>{body}</p>"));
    }
    doc.push_str("</r>");
    doc
}

fn small_config() -> ExtractConfig {
    ExtractConfig::new(ElementNames::new("r", "h", "p", "t"))
        .with_separators("", "")
        .with_progress_unit(0)
}

proptest! {
    #[test]
    fn sequences_are_dense_and_ordered(bodies in prop::collection::vec("[a-z ]{0,12}", 0..20)) {
        let doc = build_document(&bodies);
        let mut extractor = Extractor::new(small_config(), MemorySink::new());
        let count = extractor.extract(doc.as_bytes()).unwrap();

        prop_assert_eq!(count, bodies.len());
        let records = &extractor.sink().records;
        for (i, record) in records.iter().enumerate() {
            prop_assert_eq!(record.sequence, i as u64 + 1);
            prop_assert_eq!(&record.label, &format!("label{i}"));
            let expected = format!("<r><h>head</h><p><t>label{i}</t>{}</p></r>", bodies[i]);
            prop_assert_eq!(record.document_str(), expected.as_str());
        }
    }

    #[test]
    fn repeated_runs_are_identical(bodies in prop::collection::vec("[a-z]{0,8}", 1..10)) {
        let doc = build_document(&bodies);
        let mut extractor = Extractor::new(small_config(), MemorySink::new());
        extractor.extract(doc.as_bytes()).unwrap();
        extractor.extract(doc.as_bytes()).unwrap();

        let records = &extractor.sink().records;
        let (first, second) = records.split_at(bodies.len());
        prop_assert_eq!(first, second);
    }
}
