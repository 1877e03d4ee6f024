//! DOCX: paragraphs of `word/document.xml`.
//!
//! Only `w:t` runs contribute characters; `w:tab` and `w:br` become a tab
//! and a newline. Field instructions (`w:instrText`) and tracked deletions
//! (`w:delText`) are skipped because they never render as body text.

use super::{corrupt, read_zip_entry};
use crate::error::DocTextError;
use crate::output::DocumentFormat;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Cursor;

const DOCUMENT_XML: &str = "word/document.xml";

pub fn extract_text(bytes: &[u8], file_name: &str) -> Result<String, DocTextError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| corrupt(DocumentFormat::Docx, file_name, e))?;
    let xml = read_zip_entry(&mut archive, DOCUMENT_XML)
        .map_err(|e| corrupt(DocumentFormat::Docx, file_name, e))?
        .ok_or_else(|| corrupt(DocumentFormat::Docx, file_name, format!("missing {DOCUMENT_XML}")))?;
    let paragraphs = document_paragraphs(&xml)
        .map_err(|e| corrupt(DocumentFormat::Docx, file_name, e))?;
    Ok(paragraphs.join("\n"))
}

/// Non-empty paragraph texts of a `word/document.xml` body.
pub fn document_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = std::mem::take(&mut current);
                    if !text.trim().is_empty() {
                        paragraphs.push(text.trim_end().to_string());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>보고서 제목</w:t></w:r></w:p>
    <w:p>
      <w:r><w:t xml:space="preserve">첫 번째 </w:t></w:r>
      <w:r><w:instrText>PAGE</w:instrText></w:r>
      <w:r><w:t>문단 &amp; 내용</w:t><w:tab/><w:t>끝</w:t></w:r>
    </w:p>
    <w:p></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn paragraphs_from_document_xml() {
        let paragraphs = document_paragraphs(BODY).unwrap();
        assert_eq!(paragraphs, vec!["보고서 제목", "첫 번째 문단 & 내용\t끝"]);
    }

    #[test]
    fn extract_from_archive() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file(DOCUMENT_XML, options).unwrap();
        writer.write_all(BODY.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let text = extract_text(&bytes, "report.docx").unwrap();
        assert_eq!(text, "보고서 제목\n첫 번째 문단 & 내용\t끝");
    }

    #[test]
    fn archive_without_body_is_corrupt() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("word/styles.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_text(&bytes, "empty.docx").unwrap_err();
        assert!(matches!(err, DocTextError::CorruptDocument { .. }), "got: {err}");
    }

    #[test]
    fn non_zip_is_corrupt() {
        assert!(extract_text(b"not a zip", "x.docx").is_err());
    }
}
