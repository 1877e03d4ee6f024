//! HWP 5.x compound-file parser.
//!
//! An HWP 5 document is an OLE compound file. The parts this parser reads:
//!
//! | Stream              | Content                                           |
//! |---------------------|---------------------------------------------------|
//! | `FileHeader`        | signature, version, property bits (compressed, …) |
//! | `BodyText/SectionN` | tagged records, raw-deflate compressed if flagged |
//! | `PrvText`           | UTF-16LE preview of the first page                |
//!
//! Section streams are a flat sequence of records, each with a 32-bit header
//! packing `tag` (10 bits), `level` (10 bits) and `size` (12 bits, `0xFFF`
//! meaning a 32-bit size follows). Paragraph text lives in `PARA_TEXT`
//! records as UTF-16LE with embedded control codes.
//!
//! A truncated or malformed record ends its section; everything decoded up
//! to that point is kept.

use super::{LegacyParser, ParseError, ParsedDocument};
use crate::pipeline::sniff::HWP_SIGNATURE;
use flate2::read::DeflateDecoder;
use serde_json::json;
use std::io::{Cursor, Read, Seek};
use tracing::debug;

const HWPTAG_BEGIN: u32 = 0x10;
/// Record tag carrying a paragraph's characters.
pub const HWPTAG_PARA_TEXT: u32 = HWPTAG_BEGIN + 51;
/// Inline and extended controls occupy this many UTF-16 units.
const CONTROL_WIDTH: usize = 8;
const EXTENDED_SIZE: u32 = 0xFFF;

/// The built-in [`LegacyParser`] for HWP 5.x documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundFileParser;

impl LegacyParser for CompoundFileParser {
    fn name(&self) -> &str {
        "compound-file"
    }

    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let mut file = cfb::CompoundFile::open(Cursor::new(bytes))
            .map_err(|e| ParseError::NotCompound(e.to_string()))?;

        let header = FileHeader::parse(&read_stream(&mut file, "/FileHeader")?)?;
        if header.encrypted {
            return Err(ParseError::Encrypted);
        }
        if header.distribution {
            return Err(ParseError::DistributionOnly);
        }

        let section_paths = section_streams(&file)?;
        let mut sections = Vec::with_capacity(section_paths.len());
        for path in &section_paths {
            let raw = read_stream(&mut file, path)?;
            let data = if header.compressed { inflate(&raw) } else { raw };
            let paragraphs = paragraph_texts(&data);
            debug!(section = %path, paragraphs = paragraphs.len(), "decoded section");
            sections.push(json!({
                "paragraphs": paragraphs
                    .into_iter()
                    .map(|text| json!({ "text": text }))
                    .collect::<Vec<_>>(),
            }));
        }

        let preview = if file.exists("/PrvText") {
            read_stream(&mut file, "/PrvText").ok().map(|raw| decode_utf16le(&raw))
        } else {
            None
        };

        Ok(ParsedDocument::Tree(json!({
            "version": header.version_string(),
            "compressed": header.compressed,
            "sections": sections,
            "previewText": preview,
        })))
    }
}

// ── FileHeader ───────────────────────────────────────────────────────────────

/// Decoded `FileHeader` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Packed `MM.nn.PP.rr` version.
    pub version: u32,
    pub compressed: bool,
    pub encrypted: bool,
    pub distribution: bool,
}

impl FileHeader {
    const VERSION_OFFSET: usize = 32;
    const PROPERTIES_OFFSET: usize = 36;

    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < Self::PROPERTIES_OFFSET + 4 || !bytes.starts_with(HWP_SIGNATURE) {
            return Err(ParseError::BadSignature);
        }
        let version = read_u32(bytes, Self::VERSION_OFFSET);
        let properties = read_u32(bytes, Self::PROPERTIES_OFFSET);
        Ok(Self {
            version,
            compressed: properties & 0b001 != 0,
            encrypted: properties & 0b010 != 0,
            distribution: properties & 0b100 != 0,
        })
    }

    pub fn version_string(&self) -> String {
        let v = self.version;
        format!("{}.{}.{}.{}", v >> 24, (v >> 16) & 0xFF, (v >> 8) & 0xFF, v & 0xFF)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

// ── Streams ──────────────────────────────────────────────────────────────────

fn read_stream<F: Read + Seek>(
    file: &mut cfb::CompoundFile<F>,
    path: &str,
) -> Result<Vec<u8>, ParseError> {
    if !file.is_stream(path) {
        return Err(ParseError::MissingStream(path.trim_start_matches('/').to_string()));
    }
    let mut stream = file.open_stream(path).map_err(|source| ParseError::Io {
        stream: path.to_string(),
        source,
    })?;
    let mut data = Vec::new();
    stream.read_to_end(&mut data).map_err(|source| ParseError::Io {
        stream: path.to_string(),
        source,
    })?;
    Ok(data)
}

/// `BodyText/Section*` stream paths in section order.
fn section_streams<F: Read + Seek>(file: &cfb::CompoundFile<F>) -> Result<Vec<String>, ParseError> {
    let entries = file
        .read_storage("/BodyText")
        .map_err(|_| ParseError::NoSections)?;
    let mut sections: Vec<(u32, String)> = entries
        .filter(|e| e.is_stream())
        .filter_map(|e| {
            let index = e.name().strip_prefix("Section")?.parse().ok()?;
            Some((index, format!("/BodyText/{}", e.name())))
        })
        .collect();
    if sections.is_empty() {
        return Err(ParseError::NoSections);
    }
    sections.sort_by_key(|(index, _)| *index);
    Ok(sections.into_iter().map(|(_, path)| path).collect())
}

/// Raw-deflate decode; keeps a partial result on a truncated stream.
fn inflate(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    match DeflateDecoder::new(raw).read_to_end(&mut out) {
        Ok(_) => out,
        Err(e) if !out.is_empty() => {
            debug!(error = %e, recovered = out.len(), "section inflate truncated");
            out
        }
        Err(e) => {
            debug!(error = %e, "section not deflated; using raw bytes");
            raw.to_vec()
        }
    }
}

fn decode_utf16le(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units).trim().to_string()
}

// ── Records ──────────────────────────────────────────────────────────────────

/// One tagged record inside a section stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub tag: u32,
    pub level: u32,
    pub payload: &'a [u8],
}

/// Iterator over the records of a decompressed section.
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        if self.pos + 4 > self.data.len() {
            return None;
        }
        let header = read_u32(self.data, self.pos);
        self.pos += 4;

        let tag = header & 0x3FF;
        let level = (header >> 10) & 0x3FF;
        let mut size = (header >> 20) as usize;
        if size == EXTENDED_SIZE as usize {
            if self.pos + 4 > self.data.len() {
                self.pos = self.data.len();
                return None;
            }
            size = read_u32(self.data, self.pos) as usize;
            self.pos += 4;
        }

        let end = self.pos.checked_add(size).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            self.pos = self.data.len();
            return None;
        };
        let payload = &self.data[self.pos..end];
        self.pos = end;
        Some(Record { tag, level, payload })
    }
}

/// Text of every non-empty paragraph in a decompressed section.
pub fn paragraph_texts(section: &[u8]) -> Vec<String> {
    Records::new(section)
        .filter(|r| r.tag == HWPTAG_PARA_TEXT)
        .map(|r| decode_para_text(r.payload))
        .map(|t| t.trim_end().to_string())
        .filter(|t| !t.trim().is_empty())
        .collect()
}

/// Decode a `PARA_TEXT` payload, expanding or skipping control codes.
pub fn decode_para_text(payload: &[u8]) -> String {
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let mut text: Vec<u16> = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if unit >= 32 {
            text.push(unit);
            i += 1;
            continue;
        }
        match unit {
            // Single-unit char controls.
            10 => text.push(u16::from(b'\n')),
            24 => text.push(u16::from(b'-')),
            30 | 31 => text.push(u16::from(b' ')),
            0 | 13 | 25..=29 => {}
            // Inline tab: keep it, skip its parameter block.
            9 => {
                text.push(u16::from(b'\t'));
                i += CONTROL_WIDTH;
                continue;
            }
            // Inline and extended controls (tables, fields, footnotes, ...).
            _ => {
                i += CONTROL_WIDTH;
                continue;
            }
        }
        i += 1;
    }
    String::from_utf16_lossy(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn record(tag: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        if payload.len() < EXTENDED_SIZE as usize {
            out.extend_from_slice(&(tag | ((payload.len() as u32) << 20)).to_le_bytes());
        } else {
            out.extend_from_slice(&(tag | (EXTENDED_SIZE << 20)).to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        }
        out.extend_from_slice(payload);
        out
    }

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn para_text(text: &str) -> Vec<u8> {
        let mut payload = utf16(text);
        payload.extend_from_slice(&13u16.to_le_bytes());
        record(HWPTAG_PARA_TEXT, &payload)
    }

    fn build_hwp(paragraphs: &[&str], compressed: bool, properties_extra: u32) -> Vec<u8> {
        let mut section = Vec::new();
        for p in paragraphs {
            section.extend(record(HWPTAG_BEGIN + 50, &[0u8; 22]));
            section.extend(para_text(p));
        }
        if compressed {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(&section).unwrap();
            section = enc.finish().unwrap();
        }

        let mut header = vec![0u8; 256];
        header[..HWP_SIGNATURE.len()].copy_from_slice(HWP_SIGNATURE);
        header[32..36].copy_from_slice(&0x0500_0300u32.to_le_bytes());
        let props = u32::from(compressed) | properties_extra;
        header[36..40].copy_from_slice(&props.to_le_bytes());

        let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        comp.create_storage("/BodyText").unwrap();
        {
            let mut s = comp.create_stream("/FileHeader").unwrap();
            s.write_all(&header).unwrap();
            s.flush().unwrap();
        }
        {
            let mut s = comp.create_stream("/BodyText/Section0").unwrap();
            s.write_all(&section).unwrap();
            s.flush().unwrap();
        }
        {
            let mut s = comp.create_stream("/PrvText").unwrap();
            s.write_all(&utf16("미리보기 본문")).unwrap();
            s.flush().unwrap();
        }
        comp.flush().unwrap();
        comp.into_inner().into_inner()
    }

    fn tree(doc: ParsedDocument) -> serde_json::Value {
        match doc {
            ParsedDocument::Tree(v) => v,
            other => panic!("expected tree, got {other:?}"),
        }
    }

    #[test]
    fn parses_compressed_sections() {
        let bytes = build_hwp(&["첫 번째 문단입니다", "두 번째 문단입니다"], true, 0);
        let doc = tree(CompoundFileParser.parse(&bytes).unwrap());
        assert_eq!(doc["version"], "5.0.3.0");
        assert_eq!(doc["compressed"], true);
        assert_eq!(doc["sections"][0]["paragraphs"][0]["text"], "첫 번째 문단입니다");
        assert_eq!(doc["sections"][0]["paragraphs"][1]["text"], "두 번째 문단입니다");
        assert_eq!(doc["previewText"], "미리보기 본문");
    }

    #[test]
    fn parses_uncompressed_sections() {
        let bytes = build_hwp(&["압축하지 않은 문서"], false, 0);
        let doc = tree(CompoundFileParser.parse(&bytes).unwrap());
        assert_eq!(doc["compressed"], false);
        assert_eq!(doc["sections"][0]["paragraphs"][0]["text"], "압축하지 않은 문서");
    }

    #[test]
    fn encrypted_documents_are_rejected() {
        let bytes = build_hwp(&["비밀"], false, 0b010);
        assert!(matches!(CompoundFileParser.parse(&bytes), Err(ParseError::Encrypted)));
    }

    #[test]
    fn non_compound_input_is_rejected() {
        let err = CompoundFileParser.parse(b"HWP Document File V3.00").unwrap_err();
        assert!(matches!(err, ParseError::NotCompound(_)), "got: {err}");
    }

    #[test]
    fn control_codes_are_expanded_or_skipped() {
        let mut units: Vec<u16> = "가나".encode_utf16().collect();
        // Extended control (table) with its 7-unit parameter block.
        units.extend_from_slice(&[11, 0x7462, 0x6C62, 0, 0, 0, 0, 11]);
        units.extend("다".encode_utf16());
        units.push(10);
        units.extend("라".encode_utf16());
        units.push(30);
        units.extend("마".encode_utf16());
        units.push(13);
        let payload: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_para_text(&payload), "가나다\n라 마");
    }

    #[test]
    fn truncated_record_ends_section() {
        let mut section = para_text("온전한 문단");
        // Header claims 100 bytes but only 4 follow.
        section.extend_from_slice(&(HWPTAG_PARA_TEXT | (100 << 20)).to_le_bytes());
        section.extend_from_slice(&[0x00, 0xAC, 0x01, 0xAC]);
        assert_eq!(paragraph_texts(&section), vec!["온전한 문단".to_string()]);
    }

    #[test]
    fn extended_record_size_is_honoured() {
        let long = "가".repeat(3000);
        let section = para_text(&long);
        let records: Vec<_> = Records::new(&section).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload.len(), 3001 * 2);
        assert_eq!(paragraph_texts(&section), vec![long]);
    }

    #[test]
    fn file_header_bits() {
        let mut header = vec![0u8; 256];
        header[..HWP_SIGNATURE.len()].copy_from_slice(HWP_SIGNATURE);
        header[36] = 0b101;
        let h = FileHeader::parse(&header).unwrap();
        assert!(h.compressed);
        assert!(!h.encrypted);
        assert!(h.distribution);
        assert!(matches!(FileHeader::parse(b"short"), Err(ParseError::BadSignature)));
    }
}
