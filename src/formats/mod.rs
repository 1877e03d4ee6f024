//! Direct extractors for formats that do not need recovery heuristics.
//!
//! Each submodule turns the bytes of one container format into plain text.
//! All of them are synchronous and CPU-bound; [`extract_direct`] is the
//! single entry point the orchestrator runs on the blocking pool.
//!
//! | Format | Backend |
//! |--------|---------|
//! | PDF    | pdfium (`pdfium-render`) |
//! | DOCX   | `zip` + `quick-xml` over `word/document.xml` |
//! | XLSX   | `calamine`, one CSV block per sheet |
//! | HWPX   | `zip` + `quick-xml` over `Contents.xml` or `Contents/section*.xml` |
//! | TXT/CSV| UTF-8 / UTF-16 by BOM, EUC-KR fallback (`encoding_rs`) |

pub mod docx;
pub mod hwpx;
pub mod pdf;
pub mod text;
pub mod xlsx;

use crate::error::DocTextError;
use crate::output::{DocumentFormat, RawDocument};

/// Extract text from a non-HWP document.
///
/// Legacy HWP formats and [`DocumentFormat::Unknown`] are rejected with
/// [`DocTextError::UnsupportedFormat`]; the orchestrator routes HWP through
/// the strategy chain before it gets here.
pub fn extract_direct(doc: &RawDocument) -> Result<String, DocTextError> {
    let bytes = &doc.bytes[..];
    let name = doc.file_name.as_str();
    match doc.format {
        DocumentFormat::Pdf => pdf::extract_text(bytes, name),
        DocumentFormat::Docx => docx::extract_text(bytes, name),
        DocumentFormat::Xlsx => xlsx::extract_text(bytes, name),
        DocumentFormat::Hwpx => hwpx::extract_text(bytes, name),
        DocumentFormat::Txt | DocumentFormat::Csv => Ok(text::decode(bytes)),
        DocumentFormat::Hwp | DocumentFormat::HwpCompound | DocumentFormat::Unknown => {
            Err(DocTextError::UnsupportedFormat {
                file_name: doc.file_name.clone(),
            })
        }
    }
}

/// Shorthand for a [`DocTextError::CorruptDocument`].
pub(crate) fn corrupt(format: DocumentFormat, file_name: &str, detail: impl ToString) -> DocTextError {
    DocTextError::CorruptDocument {
        format,
        file_name: file_name.to_string(),
        detail: detail.to_string(),
    }
}

/// Read one ZIP entry as UTF-8 (BOM stripped). `Ok(None)` when the entry is absent.
pub(crate) fn read_zip_entry(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, zip::result::ZipError> {
    use std::io::Read;

    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut raw = Vec::new();
    entry.read_to_end(&mut raw)?;
    let text = String::from_utf8_lossy(&raw);
    Ok(Some(text.trim_start_matches('\u{FEFF}').to_string()))
}
