//! HWPX: the ZIP + XML successor of HWP.
//!
//! Two layouts exist in the wild:
//!
//! * early HWPML-in-ZIP with a single `Contents.xml` (`HWPML/BODY/SECTION/P`,
//!   text directly in `P` or in `RUN` children);
//! * OWPML with one `Contents/section{N}.xml` per section
//!   (`hs:sec/hp:p/hp:run/hp:t`).
//!
//! Element names are matched case-insensitively on their local name, so both
//! layouts share one walker. Each paragraph becomes one output line.

use super::{corrupt, read_zip_entry};
use crate::error::DocTextError;
use crate::output::DocumentFormat;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Cursor;
use tracing::debug;

const LEGACY_CONTENTS: &str = "Contents.xml";

pub fn extract_text(bytes: &[u8], file_name: &str) -> Result<String, DocTextError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| corrupt(DocumentFormat::Hwpx, file_name, e))?;

    let parts = content_parts(&archive);
    if parts.is_empty() {
        return Err(DocTextError::MissingHwpxContents {
            file_name: file_name.to_string(),
        });
    }

    let mut lines = Vec::new();
    for part in &parts {
        let xml = read_zip_entry(&mut archive, part)
            .map_err(|e| corrupt(DocumentFormat::Hwpx, file_name, e))?
            .unwrap_or_default();
        let paragraphs =
            paragraphs(&xml).map_err(|e| corrupt(DocumentFormat::Hwpx, file_name, format!("{part}: {e}")))?;
        debug!(part = %part, paragraphs = paragraphs.len(), "read HWPX part");
        lines.extend(paragraphs);
    }
    Ok(lines.join("\n").trim().to_string())
}

/// `Contents.xml` if present, otherwise `Contents/section*.xml` in section order.
fn content_parts(archive: &zip::ZipArchive<Cursor<&[u8]>>) -> Vec<String> {
    if archive.index_for_name(LEGACY_CONTENTS).is_some() {
        return vec![LEGACY_CONTENTS.to_string()];
    }
    let mut sections: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let index = name
                .strip_prefix("Contents/section")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((index, name.to_string()))
        })
        .collect();
    sections.sort_by_key(|(index, _)| *index);
    sections.into_iter().map(|(_, name)| name).collect()
}

fn is_named(name: &[u8], expected: &[u8]) -> bool {
    name.eq_ignore_ascii_case(expected)
}

/// Elements whose direct text is paragraph content.
fn carries_text(name: &[u8]) -> bool {
    ["t", "char", "text"].iter().any(|n| is_named(name, n.as_bytes()))
}

/// Paragraph lines of one HWPX XML part.
pub fn paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut elements: Vec<Vec<u8>> = Vec::new();
    // Open paragraphs; tables nest paragraphs inside paragraphs.
    let mut open: Vec<String> = Vec::new();
    let mut lines = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if is_named(&name, b"p") {
                    open.push(String::new());
                } else if is_named(&name, b"tab") {
                    push_text(&mut open, "\t");
                }
                elements.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if is_named(name.as_ref(), b"tab") {
                    push_text(&mut open, "\t");
                } else if is_named(name.as_ref(), b"linebreak") {
                    push_text(&mut open, "\n");
                }
            }
            Event::Text(t) => {
                let parent = elements.last().map(Vec::as_slice).unwrap_or_default();
                let text = t.unescape()?;
                if carries_text(parent) {
                    push_text(&mut open, &text);
                } else if (is_named(parent, b"p") || is_named(parent, b"run")) && !text.trim().is_empty() {
                    // Whitespace-only text here is indentation; the rest keeps
                    // its spacing and the paragraph is trimmed as a whole.
                    push_text(&mut open, &text);
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_text(&mut open, &text);
            }
            Event::End(e) => {
                if is_named(e.local_name().as_ref(), b"p") {
                    if let Some(paragraph) = open.pop() {
                        let paragraph = paragraph.trim();
                        if !paragraph.is_empty() {
                            lines.push(paragraph.to_string());
                        }
                    }
                }
                elements.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(lines)
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn legacy_contents_round_trip() {
        let bytes = archive(&[(
            "Contents.xml",
            "<HWPML><BODY><SECTION><P>안녕하세요</P></SECTION></BODY></HWPML>",
        )]);
        assert_eq!(extract_text(&bytes, "a.hwpx").unwrap(), "안녕하세요");
    }

    #[test]
    fn legacy_runs_and_paragraphs() {
        let xml = "<HWPML><BODY><SECTION>\
            <P><RUN>첫 줄</RUN><RUN> 계속</RUN></P>\
            <P>둘째 줄</P>\
            <P></P>\
            </SECTION></BODY></HWPML>";
        assert_eq!(paragraphs(xml).unwrap(), vec!["첫 줄 계속", "둘째 줄"]);
    }

    #[test]
    fn legacy_run_spacing_survives_and_paragraph_is_trimmed() {
        let bytes = archive(&[(
            "Contents.xml",
            "<HWPML><BODY><SECTION>\n  <P>\n    <RUN>첫 줄</RUN><RUN> 계속</RUN>\n  </P>\n\
             <P>  앞뒤 공백  </P>\n</SECTION></BODY></HWPML>",
        )]);
        assert_eq!(extract_text(&bytes, "a.hwpx").unwrap(), "첫 줄 계속\n앞뒤 공백");
    }

    #[test]
    fn owpml_sections_in_order() {
        let section = |body: &str| {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<hs:sec xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section" xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph">
  <hp:p id="0"><hp:run charPrIDRef="0"><hp:secPr/></hp:run></hp:p>
  {body}
</hs:sec>"#
            )
        };
        let s0 = section("<hp:p><hp:run><hp:t>첫 문단</hp:t></hp:run></hp:p>");
        let s1 = section("<hp:p><hp:run><hp:t>둘째</hp:t><hp:tab/><hp:t>문단 &lt;표&gt;</hp:t></hp:run></hp:p>");
        let s10 = section("<hp:p><hp:run><hp:t>열한째 구역</hp:t></hp:run></hp:p>");
        let bytes = archive(&[
            ("mimetype", "application/hwp+zip"),
            ("Contents/section10.xml", s10.as_str()),
            ("Contents/section1.xml", s1.as_str()),
            ("Contents/section0.xml", s0.as_str()),
            ("Contents/header.xml", "<hh:head/>"),
        ]);
        let text = extract_text(&bytes, "doc.hwpx").unwrap();
        assert_eq!(text, "첫 문단\n둘째\t문단 <표>\n열한째 구역");
    }

    #[test]
    fn table_cells_become_lines() {
        let xml = "<sec><p><run><t>표 앞</t><tbl><tr><tc><subList>\
            <p><run><t>셀 하나</t></run></p>\
            </subList></tc></tr></tbl></run></p></sec>";
        assert_eq!(paragraphs(xml).unwrap(), vec!["셀 하나", "표 앞"]);
    }

    #[test]
    fn missing_contents_is_reported() {
        let bytes = archive(&[("mimetype", "application/hwp+zip")]);
        let err = extract_text(&bytes, "broken.hwpx").unwrap_err();
        assert!(matches!(err, DocTextError::MissingHwpxContents { .. }), "got: {err}");
    }
}
