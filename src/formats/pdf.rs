//! PDF text layer extraction via pdfium.
//!
//! pdfium wraps a C++ library with global state; every call here is
//! blocking and must run on the blocking pool. Scanned PDFs without a text
//! layer yield an empty string, not an error.

use super::corrupt;
use crate::error::DocTextError;
use crate::output::DocumentFormat;
use pdfium_render::prelude::*;
use tracing::debug;

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, DocTextError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => Pdfium::bind_to_library(path.trim()),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DocTextError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

pub fn extract_text(bytes: &[u8], file_name: &str) -> Result<String, DocTextError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| corrupt(DocumentFormat::Pdf, file_name, format!("{e:?}")))?;

    let mut pages = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| corrupt(DocumentFormat::Pdf, file_name, format!("page {}: {e:?}", index + 1)))?
            .all();
        let text = text.trim();
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }
    debug!(file_name, pages = pages.len(), "extracted PDF text layer");
    Ok(pages.join("\n\n"))
}
