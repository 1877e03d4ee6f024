//! Output and data-model types.
//!
//! [`ExtractionOutput`] is what every `extract*` entry point returns. It is
//! `Serialize` so the CLI `--json` mode and the HTTP layer can emit it
//! unchanged.

use crate::error::StrategyFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ── Formats ──────────────────────────────────────────────────────────────

/// Detected container format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentFormat {
    /// Legacy HWP 3.x binary ("HWP Document File" signature).
    Hwp,
    /// HWP 5.x: OLE compound file with `FileHeader` and `BodyText/Section*`.
    HwpCompound,
    /// ZIP + XML successor format.
    Hwpx,
    Pdf,
    Docx,
    Xlsx,
    Txt,
    Csv,
    Unknown,
}

impl DocumentFormat {
    /// Formats that go through the multi-strategy recovery chain.
    pub fn is_legacy_hwp(self) -> bool {
        matches!(self, DocumentFormat::Hwp | DocumentFormat::HwpCompound)
    }

    /// Map a lowercase file extension to a format.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "hwp" => DocumentFormat::Hwp,
            "hwpx" => DocumentFormat::Hwpx,
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "xlsx" => DocumentFormat::Xlsx,
            "txt" | "text" => DocumentFormat::Txt,
            "csv" => DocumentFormat::Csv,
            _ => DocumentFormat::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Hwp => "hwp",
            DocumentFormat::HwpCompound => "hwp-compound",
            DocumentFormat::Hwpx => "hwpx",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Txt => "txt",
            DocumentFormat::Csv => "csv",
            DocumentFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input document held in memory.
///
/// Bytes are shared via `Arc` so strategies can move them onto blocking
/// threads without copying.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Arc<[u8]>,
    pub format: DocumentFormat,
    /// Original file name, used for extension fallback and converter inputs.
    pub file_name: String,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Arc<[u8]>>, format: DocumentFormat, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            format,
            file_name: file_name.into(),
        }
    }
}

/// Lowercase extension of a file name (`"a.HWP"` → `"hwp"`).
pub fn file_extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

// ── Strategies ───────────────────────────────────────────────────────────

/// The recovery strategies applied to legacy HWP documents, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Structured parse of the container, then a tree walk for text.
    StructureWalk,
    /// Scan raw bytes for legacy double-byte Hangul pairs.
    ByteScan,
    /// Decode the whole buffer under modern encodings and filter.
    EncodingProbe,
    /// Hand the file to an external conversion service.
    ExternalConverter,
}

impl StrategyKind {
    /// Default chain order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::StructureWalk,
        StrategyKind::ByteScan,
        StrategyKind::EncodingProbe,
        StrategyKind::ExternalConverter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::StructureWalk => "structure-walk",
            StrategyKind::ByteScan => "byte-scan",
            StrategyKind::EncodingProbe => "encoding-probe",
            StrategyKind::ExternalConverter => "external-converter",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured properties of a cleaned candidate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityScore {
    /// Hangul syllables counted after penalising long alphanumeric runs.
    pub hangul_chars: usize,
    /// Character length of the trimmed text, measured after the same penalty.
    pub length: usize,
}

/// A strategy output that passed the quality gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    pub text: String,
    pub strategy: StrategyKind,
    pub score: QualityScore,
}

/// Every strategy failed; carries the user-facing explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    /// One entry per attempted strategy, in attempt order.
    pub reasons: Vec<StrategyFailure>,
    /// Explanation of why recovery failed and which formats to use instead.
    pub message: String,
}

/// Result of running the HWP strategy chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Accepted(ExtractionCandidate),
    Exhausted(ExtractionFailure),
}

impl ExtractionOutcome {
    /// Text delivered to the caller: the accepted text or the explanatory message.
    pub fn text(&self) -> &str {
        match self {
            ExtractionOutcome::Accepted(c) => &c.text,
            ExtractionOutcome::Exhausted(f) => &f.message,
        }
    }
}

// ── Final output ─────────────────────────────────────────────────────────

/// Timing and attempt statistics for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Wall-clock time from input resolution to the final text.
    pub total_duration_ms: u64,
    /// Number of HWP strategies attempted (0 for direct formats).
    pub strategies_attempted: usize,
}

/// Complete result of one extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Extracted plain text, or the explanatory message when HWP recovery
    /// was exhausted (see [`Self::failure`]).
    pub text: String,
    pub format: DocumentFormat,
    pub file_name: String,
    /// Which strategy produced the text for legacy HWP inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    /// Set when every HWP strategy was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExtractionFailure>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// `true` when the text is real document content rather than an
    /// exhaustion message.
    pub fn is_recovered(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_serialises_kebab_case() {
        let json = serde_json::to_string(&DocumentFormat::HwpCompound).unwrap();
        assert_eq!(json, "\"hwp-compound\"");
        assert_eq!(DocumentFormat::HwpCompound.to_string(), "hwp-compound");
    }

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_extension("HWPX"), DocumentFormat::Hwpx);
        assert_eq!(DocumentFormat::from_extension("csv"), DocumentFormat::Csv);
        assert_eq!(DocumentFormat::from_extension("png"), DocumentFormat::Unknown);
        assert_eq!(file_extension("보고서.HWP").as_deref(), Some("hwp"));
        assert_eq!(file_extension("README"), None);
    }

    #[test]
    fn strategy_order_matches_chain() {
        assert_eq!(StrategyKind::ALL[0], StrategyKind::StructureWalk);
        assert_eq!(StrategyKind::ALL[3], StrategyKind::ExternalConverter);
    }

    #[test]
    fn outcome_text_prefers_candidate() {
        let accepted = ExtractionOutcome::Accepted(ExtractionCandidate {
            text: "본문".into(),
            strategy: StrategyKind::ByteScan,
            score: QualityScore::default(),
        });
        assert_eq!(accepted.text(), "본문");

        let exhausted = ExtractionOutcome::Exhausted(ExtractionFailure {
            reasons: vec![],
            message: "cannot recover".into(),
        });
        assert_eq!(exhausted.text(), "cannot recover");
    }

    #[test]
    fn output_skips_empty_optionals() {
        let out = ExtractionOutput {
            text: "hello".into(),
            format: DocumentFormat::Txt,
            file_name: "a.txt".into(),
            strategy: None,
            failure: None,
            stats: ExtractionStats::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("strategy").is_none());
        assert!(json.get("failure").is_none());
        assert_eq!(json["format"], "txt");
        assert!(out.is_recovered());
    }
}
