//! Error types for the doctext library.
//!
//! Two distinct failure modes get two distinct representations:
//!
//! * [`DocTextError`]: **Fatal**: the request cannot be served at all
//!   (missing file, unsupported format, corrupt container). Returned as
//!   `Err(DocTextError)` from the top-level `extract*` functions.
//!
//! * [`StrategyFailure`]: **Non-fatal**: one recovery strategy for a legacy
//!   HWP document produced nothing usable. Failures are collected inside
//!   [`crate::output::ExtractionFailure`] and reported alongside the
//!   explanatory message, never propagated. Running out of strategies is an
//!   expected outcome, not an error.
//!
//! Component-level errors ([`crate::hwp::ParseError`],
//! [`crate::converter::ConverterError`]) are flattened into strategy failures
//! by the orchestrator.

use crate::output::{DocumentFormat, StrategyKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doctext library.
#[derive(Debug, Error)]
pub enum DocTextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The uploaded or decoded payload is empty or malformed.
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Format errors ─────────────────────────────────────────────────────
    /// Neither the content nor the file extension identifies a supported format.
    #[error(
        "Unsupported file format: '{file_name}'\n\
Supported formats: HWP, HWPX, PDF, DOCX, XLSX, TXT, CSV."
    )]
    UnsupportedFormat { file_name: String },

    /// A specific format was required (e.g. the HWPX endpoint) but another was supplied.
    #[error("Expected a {expected} document but '{file_name}' is {actual}")]
    UnexpectedFormat {
        file_name: String,
        expected: DocumentFormat,
        actual: DocumentFormat,
    },

    /// The container was recognised but its content could not be read.
    #[error("{format} document '{file_name}' is corrupt: {detail}")]
    CorruptDocument {
        format: DocumentFormat,
        file_name: String,
        detail: String,
    },

    /// An HWPX archive without `Contents.xml` or `Contents/section*.xml`.
    #[error("HWPX document '{file_name}' has no Contents.xml or section parts")]
    MissingHwpxContents { file_name: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF text extraction needs a pdfium shared library. You can:\n\
  • Install libpdfium system-wide (it is then found automatically).\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocTextError {
    /// `true` when the caller supplied something we cannot work with.
    ///
    /// The HTTP layer maps these to `400 Bad Request` and everything else to
    /// `500 Internal Server Error`.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocTextError::FileNotFound { .. }
                | DocTextError::InvalidInput { .. }
                | DocTextError::InvalidPayload { .. }
                | DocTextError::DownloadFailed { .. }
                | DocTextError::DownloadTimeout { .. }
                | DocTextError::UnsupportedFormat { .. }
                | DocTextError::UnexpectedFormat { .. }
                | DocTextError::CorruptDocument { .. }
                | DocTextError::MissingHwpxContents { .. }
        )
    }
}

/// A non-fatal failure of one HWP recovery strategy.
///
/// Stored in [`crate::output::ExtractionFailure::reasons`] in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{strategy}: {reason}")]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(strategy: StrategyKind, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_lists_alternatives() {
        let e = DocTextError::UnsupportedFormat {
            file_name: "photo.png".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("photo.png"), "got: {msg}");
        assert!(msg.contains("HWPX"), "got: {msg}");
        assert!(e.is_client_error());
    }

    #[test]
    fn corrupt_document_names_format() {
        let e = DocTextError::CorruptDocument {
            format: DocumentFormat::Docx,
            file_name: "report.docx".into(),
            detail: "missing word/document.xml".into(),
        };
        assert!(e.to_string().contains("docx"));
        assert!(e.to_string().contains("word/document.xml"));
    }

    #[test]
    fn internal_errors_are_not_client_errors() {
        assert!(!DocTextError::Internal("boom".into()).is_client_error());
        assert!(!DocTextError::PdfiumBindingFailed("no lib".into()).is_client_error());
        assert!(!DocTextError::InvalidConfig("bad".into()).is_client_error());
    }

    #[test]
    fn strategy_failure_display() {
        let f = StrategyFailure::new(StrategyKind::ByteScan, "no Hangul pairs found");
        assert_eq!(f.to_string(), "byte-scan: no Hangul pairs found");
    }
}
