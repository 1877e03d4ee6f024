//! Quality gate: decide whether a cleaned candidate counts as a recovery.
//!
//! The gate is two thresholds: enough characters and enough Hangul.
//! Long alphanumeric runs are blanked before counting so a candidate padded
//! with hashes or base64 counts toward neither threshold.

use crate::output::QualityScore;
use crate::pipeline::clean::strip_alnum_runs;
use crate::script;
use serde::{Deserialize, Serialize};

/// Acceptance thresholds for a strategy's cleaned output.
///
/// A candidate is accepted when its trimmed length is **strictly greater**
/// than `min_length` and it contains **at least** `min_hangul` syllables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    pub min_length: usize,
    pub min_hangul: usize,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            min_length: 20,
            min_hangul: 5,
        }
    }
}

impl QualityGate {
    /// Accepts short memos and single-line documents.
    pub const fn lenient() -> Self {
        Self {
            min_length: 10,
            min_hangul: 3,
        }
    }

    /// Requires a paragraph's worth of Korean prose.
    pub const fn strict() -> Self {
        Self {
            min_length: 50,
            min_hangul: 10,
        }
    }

    pub fn score(&self, text: &str) -> QualityScore {
        let penalised = strip_alnum_runs(text);
        QualityScore {
            hangul_chars: script::count_syllables(&penalised),
            length: penalised.trim().chars().count(),
        }
    }

    pub fn accepts(&self, score: &QualityScore) -> bool {
        score.length > self.min_length && score.hangul_chars >= self.min_hangul
    }

    /// Score `text` and explain a rejection in terms a log reader can act on.
    pub fn evaluate(&self, text: &str) -> Result<QualityScore, String> {
        let score = self.score(text);
        if self.accepts(&score) {
            Ok(score)
        } else {
            Err(format!(
                "below quality gate: {} chars (need > {}), {} Hangul syllables (need ≥ {})",
                score.length, self.min_length, score.hangul_chars, self.min_hangul
            ))
        }
    }
}
