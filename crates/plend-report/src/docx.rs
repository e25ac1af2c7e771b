//! Minimal WordprocessingML writer.
//!
//! A `.docx` is a zip container of XML parts. Only the three parts Word
//! requires are written: content types, the package relationship and the
//! main document holding a heading, a generation stamp, the table and its
//! notes.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ReportError;
use crate::table::ReportTable;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Half-points: 16pt heading, 10pt body.
const HEADING_SIZE: &str = "32";
const BODY_SIZE: &str = "20";

/// Write `table` to `path` as a `.docx`, stamped with the current time.
pub fn write_docx(table: &ReportTable, path: &Path) -> Result<(), ReportError> {
    let file = File::create(path)?;
    write_docx_to(table, BufWriter::new(file), Utc::now())?.flush()?;
    tracing::debug!(path = %path.display(), rows = table.rows.len(), "docx written");
    Ok(())
}

/// Write the `.docx` container into any seekable sink.
pub fn write_docx_to<W: Write + Seek>(
    table: &ReportTable,
    sink: W,
    generated: DateTime<Utc>,
) -> Result<W, ReportError> {
    table.ensure_rows()?;
    let document = document_xml(table, generated)?;

    let mut zip = ZipWriter::new(sink);
    let parts: [(&str, &[u8]); 3] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/document.xml", &document),
    ];
    for (name, bytes) in parts {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?)
}

/// The `word/document.xml` part.
pub fn document_xml(table: &ReportTable, generated: DateTime<Utc>) -> Result<Vec<u8>, ReportError> {
    let mut doc = DocWriter::new();
    doc.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", WORD_NS));
    doc.event(Event::Start(root))?;
    doc.start("w:body")?;

    doc.paragraph(&table.heading, HEADING_SIZE, true)?;
    let stamp = format!("Generated {}", generated.format("%Y-%m-%d %H:%M UTC"));
    doc.paragraph(&stamp, BODY_SIZE, false)?;

    doc.start("w:tbl")?;
    doc.start("w:tblPr")?;
    doc.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    doc.start("w:tblBorders")?;
    for edge in ["w:top", "w:bottom", "w:insideH"] {
        doc.empty(
            edge,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "000000")],
        )?;
    }
    doc.end("w:tblBorders")?;
    doc.end("w:tblPr")?;

    doc.start("w:tblGrid")?;
    for _ in &table.columns {
        doc.empty("w:gridCol", &[])?;
    }
    doc.end("w:tblGrid")?;

    doc.row(&table.columns, true)?;
    for row in &table.rows {
        doc.row(row, false)?;
    }
    doc.end("w:tbl")?;

    for note in &table.notes {
        doc.paragraph(note, BODY_SIZE, false)?;
    }

    doc.end("w:body")?;
    doc.end("w:document")?;
    Ok(doc.finish())
}

struct DocWriter {
    inner: Writer<Vec<u8>>,
}

impl DocWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), ReportError> {
        self.inner
            .write_event(event)
            .map_err(|e| ReportError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<(), ReportError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), ReportError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ReportError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.event(Event::Empty(element))
    }

    /// One run of text; `BytesText` escapes markup characters.
    fn run(&mut self, text: &str, size: &str, bold: bool) -> Result<(), ReportError> {
        self.start("w:r")?;
        self.start("w:rPr")?;
        if bold {
            self.empty("w:b", &[])?;
        }
        self.empty("w:sz", &[("w:val", size)])?;
        self.end("w:rPr")?;
        let mut t = BytesStart::new("w:t");
        t.push_attribute(("xml:space", "preserve"));
        self.event(Event::Start(t))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end("w:t")?;
        self.end("w:r")
    }

    fn paragraph(&mut self, text: &str, size: &str, bold: bool) -> Result<(), ReportError> {
        self.start("w:p")?;
        self.run(text, size, bold)?;
        self.end("w:p")
    }

    fn row(&mut self, cells: &[String], header: bool) -> Result<(), ReportError> {
        self.start("w:tr")?;
        for cell in cells {
            self.start("w:tc")?;
            self.paragraph(cell, BODY_SIZE, header)?;
            self.end("w:tc")?;
        }
        self.end("w:tr")
    }

    fn finish(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use zip::ZipArchive;

    use super::*;

    fn table() -> ReportTable {
        let mut table = ReportTable::new("H1A: DEPNDT ~ EO", &["Term", "Estimate"]);
        table.push_row(vec!["(Intercept)".into(), "1.204".into()]);
        table.push_row(vec!["EO".into(), "0.418".into()]);
        table.with_note("R2 = 0.271 & n < 60")
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn document_contains_heading_stamp_table_and_escaped_notes() {
        let xml = String::from_utf8(document_xml(&table(), stamp()).unwrap()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("H1A: DEPNDT ~ EO"));
        assert!(xml.contains("Generated 2026-03-14 09:30 UTC"));
        assert_eq!(xml.matches("<w:tr>").count(), 3);
        assert_eq!(xml.matches("<w:gridCol/>").count(), 2);
        assert!(xml.contains("R2 = 0.271 &amp; n &lt; 60"));
    }

    #[test]
    fn container_holds_the_three_parts() {
        let sink = write_docx_to(&table(), Cursor::new(Vec::new()), stamp()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]
        );

        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(document.contains("(Intercept)"));
    }

    #[test]
    fn empty_table_writes_nothing() {
        let empty = ReportTable::new("Empty", &["a"]);
        let err = write_docx_to(&empty, Cursor::new(Vec::new()), stamp()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyTable(_)));
    }
}
