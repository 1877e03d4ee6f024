//! Format detection from content, falling back to the file extension.
//!
//! Magic bytes win over the name: users routinely rename `.hwpx` files to
//! `.hwp` and upload spreadsheets with a `.csv` extension. The order is:
//!
//! 1. OLE compound file magic → [`DocumentFormat::HwpCompound`]
//! 2. `HWP Document File` signature → [`DocumentFormat::Hwp`]
//! 3. `infer` matchers for PDF and OOXML
//! 4. ZIP central directory: `Contents/` → HWPX, `word/` → DOCX, `xl/` → XLSX
//! 5. File extension
//! 6. Valid UTF-8 without NULs → [`DocumentFormat::Txt`]

use crate::output::{file_extension, DocumentFormat};
use std::io::Cursor;
use tracing::debug;

/// OLE2 / Compound File Binary signature.
pub const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
/// Signature at the start of HWP 3.x files and of the HWP 5.x `FileHeader` stream.
pub const HWP_SIGNATURE: &[u8] = b"HWP Document File";

/// Detect the format of `bytes`, using `file_name` only when content is inconclusive.
pub fn sniff(bytes: &[u8], file_name: &str) -> DocumentFormat {
    let format = sniff_content(bytes).unwrap_or_else(|| {
        let by_name = file_extension(file_name)
            .map(|ext| DocumentFormat::from_extension(&ext))
            .unwrap_or(DocumentFormat::Unknown);
        match by_name {
            DocumentFormat::Unknown if looks_like_text(bytes) => DocumentFormat::Txt,
            other => other,
        }
    });
    debug!(file_name, %format, len = bytes.len(), "sniffed format");
    format
}

fn sniff_content(bytes: &[u8]) -> Option<DocumentFormat> {
    if bytes.starts_with(&CFB_MAGIC) {
        return Some(DocumentFormat::HwpCompound);
    }
    if bytes.starts_with(HWP_SIGNATURE) {
        return Some(DocumentFormat::Hwp);
    }

    let kind = infer::get(bytes)?;
    match kind.mime_type() {
        "application/pdf" => Some(DocumentFormat::Pdf),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            Some(DocumentFormat::Docx)
        }
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
            Some(DocumentFormat::Xlsx)
        }
        "application/zip" => sniff_zip(bytes),
        // Images, audio and friends: let the extension decide.
        _ => None,
    }
}

/// Classify a ZIP archive by the entries it contains.
fn sniff_zip(bytes: &[u8]) -> Option<DocumentFormat> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut names = archive.file_names();
    names.find_map(|name| {
        if name == "Contents.xml" || name.starts_with("Contents/") {
            Some(DocumentFormat::Hwpx)
        } else if name.starts_with("word/") {
            Some(DocumentFormat::Docx)
        } else if name.starts_with("xl/") {
            Some(DocumentFormat::Xlsx)
        } else {
            None
        }
    })
}

fn looks_like_text(bytes: &[u8]) -> bool {
    !bytes.is_empty() && !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn compound_file_detected_regardless_of_name() {
        let mut bytes = CFB_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 504]);
        assert_eq!(sniff(&bytes, "report.pdf"), DocumentFormat::HwpCompound);
    }

    #[test]
    fn hwp3_signature_detected() {
        let mut bytes = b"HWP Document File V3.00".to_vec();
        bytes.extend_from_slice(&[0x1A, 1, 2, 3]);
        assert_eq!(sniff(&bytes, "old.bin"), DocumentFormat::Hwp);
    }

    #[test]
    fn pdf_magic_detected() {
        assert_eq!(sniff(b"%PDF-1.7\n%....", "scan"), DocumentFormat::Pdf);
    }

    #[test]
    fn renamed_hwpx_detected_by_entries() {
        let bytes = zip_with(&[("mimetype", "application/hwp+zip"), ("Contents/section0.xml", "<x/>")]);
        assert_eq!(sniff(&bytes, "renamed.hwp"), DocumentFormat::Hwpx);
    }

    #[test]
    fn legacy_hwpx_contents_xml_detected() {
        let bytes = zip_with(&[("Contents.xml", "<HWPML/>")]);
        assert_eq!(sniff(&bytes, "doc.zip"), DocumentFormat::Hwpx);
    }

    #[test]
    fn ooxml_archives_detected() {
        let docx = zip_with(&[("[Content_Types].xml", "<Types/>"), ("word/document.xml", "<w:document/>")]);
        assert_eq!(sniff(&docx, "a.bin"), DocumentFormat::Docx);
        let xlsx = zip_with(&[("[Content_Types].xml", "<Types/>"), ("xl/workbook.xml", "<workbook/>")]);
        assert_eq!(sniff(&xlsx, "a.bin"), DocumentFormat::Xlsx);
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(sniff(b"a,b,c\n1,2,3\n", "table.csv"), DocumentFormat::Csv);
        assert_eq!(sniff(b"\x01\x02\x03binary", "legacy.hwp"), DocumentFormat::Hwp);
        assert_eq!(sniff("그냥 텍스트".as_bytes(), "note"), DocumentFormat::Txt);
        assert_eq!(sniff(b"\x00\x01\x02", "blob"), DocumentFormat::Unknown);
    }

    #[test]
    fn images_are_unknown() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff(&png, "photo.png"), DocumentFormat::Unknown);
    }
}
