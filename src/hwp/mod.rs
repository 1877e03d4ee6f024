//! Structured access to legacy HWP documents.
//!
//! The structure-walk strategy is split in two so each half can be replaced
//! independently:
//!
//! ```text
//! bytes ──▶ LegacyParser ──▶ ParsedDocument ──▶ walker::walk ──▶ text
//!           (container)      (JSON-like tree)    (shape search)
//! ```
//!
//! [`CompoundFileParser`] is the built-in parser for HWP 5.x compound files.
//! Callers with another parser (a binding to a native library, a remote
//! parsing service) implement [`LegacyParser`] and inject it through
//! [`crate::config::ExtractionConfigBuilder::parser`]. The walker does not
//! care which parser produced the tree, only what shape it has.

pub mod parser;
pub mod walker;

pub use parser::CompoundFileParser;
pub use walker::walk;

use thiserror::Error;

/// The output of a [`LegacyParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    /// A nested tree of objects and arrays.
    Tree(serde_json::Value),
    /// The parser already produced plain text.
    Flat(String),
}

/// Why a legacy document could not be parsed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not an OLE compound file: {0}")]
    NotCompound(String),

    #[error("missing stream '{0}'")]
    MissingStream(String),

    #[error("FileHeader signature is not 'HWP Document File'")]
    BadSignature,

    #[error("document is password-protected")]
    Encrypted,

    #[error("distribution document body is encrypted")]
    DistributionOnly,

    #[error("no BodyText sections found")]
    NoSections,

    #[error("format not handled by this parser: {0}")]
    Unsupported(String),

    #[error("I/O error reading stream '{stream}': {source}")]
    Io {
        stream: String,
        #[source]
        source: std::io::Error,
    },
}

/// A parser that turns legacy HWP bytes into a walkable tree.
///
/// Implementations are synchronous and may be CPU-heavy; the orchestrator
/// calls them from `spawn_blocking`.
pub trait LegacyParser: Send + Sync {
    /// Short identifier used in logs and failure reasons.
    fn name(&self) -> &str;

    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError>;
}
