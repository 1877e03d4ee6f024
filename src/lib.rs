//! # doctext
//!
//! Extract plain text from office documents: HWP, HWPX, PDF, DOCX, XLSX,
//! TXT and CSV.
//!
//! ## Why this crate?
//!
//! Most formats have a reliable reader and go through a single pass. Legacy
//! HWP does not: it is a proprietary, versioned binary format with no
//! dependable open parser. For HWP this crate runs a chain of independently
//! fallible recovery strategies, cleans every candidate with a garbage
//! filter, and accepts the first one that looks like real Korean prose.
//!
//! ## Pipeline Overview
//!
//! ```text
//! path / URL / bytes
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Sniff     magic bytes, ZIP entries, file extension
//!  ├─ 3a. Direct   PDF · DOCX · XLSX · HWPX · TXT/CSV   (spawn_blocking)
//!  └─ 3b. HWP      structure walk → byte scan → encoding probe → converters
//!                    └─ each candidate: clean → quality gate → first accepted wins
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doctext::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Converter endpoints and credentials from DOCTEXT_* variables
//!     let config = ExtractionConfig::from_env()?;
//!     let output = extract("report.hwp", &config).await?;
//!     if output.is_recovered() {
//!         println!("{}", output.text);
//!     } else {
//!         eprintln!("{}", output.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `doctext` binary (clap + anyhow + tracing-subscriber + indicatif); implies `server` |
//! | `server` | on      | HTTP surface (`doctext::server`) on axum + tower-http |
//!
//! Disable both when using only the library:
//! ```toml
//! doctext = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDF support
//!
//! PDF text comes from pdfium. Install `libpdfium` system-wide or point
//! `PDFIUM_LIB_PATH` at a copy; other formats work without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod converter;
pub mod error;
pub mod extract;
pub mod formats;
pub mod hwp;
pub mod messages;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod script;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use converter::{
    CloudConverterConfig, ConversionInput, Converter, ConverterChain, ConverterError,
    VendorConverterConfig,
};
pub use error::{DocTextError, StrategyFailure};
pub use extract::{
    extract, extract_document, extract_file, extract_from_bytes, extract_hwpx, extract_sync,
    extract_text, extract_to_file,
};
pub use hwp::{LegacyParser, ParseError, ParsedDocument};
pub use messages::EXHAUSTED_MESSAGE;
pub use output::{
    DocumentFormat, ExtractionCandidate, ExtractionFailure, ExtractionOutcome, ExtractionOutput,
    ExtractionStats, QualityScore, RawDocument, StrategyKind,
};
pub use pipeline::clean::clean;
pub use pipeline::quality::QualityGate;
pub use pipeline::scan::ScanRanges;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
