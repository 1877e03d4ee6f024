//! User-facing text returned in place of extracted content.
//!
//! When every HWP recovery strategy fails, callers receive
//! [`EXHAUSTED_MESSAGE`] as the document text (see
//! [`crate::output::ExtractionOutput::failure`] for the per-strategy
//! reasons). The message must stay actionable: it names why automated
//! recovery did not work and which formats are reliably supported.

/// Formats that extract without heuristics, in the order users are told about them.
pub const SUPPORTED_FORMATS: [&str; 6] = ["PDF", "DOCX", "XLSX", "TXT", "CSV", "HWPX"];

/// Returned as the document text when every HWP recovery strategy fails.
pub const EXHAUSTED_MESSAGE: &str = "\
Automatic text extraction from this HWP file was not possible.

HWP is a proprietary binary format. This document could not be read by any of
the available methods:
  • The built-in parser could not read its structure (the file may be
    encrypted, distribution-protected, or written by an unsupported version).
  • No readable Korean text was found in the raw file contents.
  • No document converter (office suite or conversion service) is installed
    or configured in this environment, or every conversion attempt failed.

Please open the file in Hancom Office (or another HWP-capable editor) and save
it in one of these reliably supported formats, then upload it again:
  PDF, DOCX, XLSX, TXT, CSV, HWPX";
