//! Raw byte scanner for legacy double-byte Hangul.
//!
//! When the container cannot be parsed, text may still be sitting in the
//! file as KS X 1001 byte pairs. The scanner tries three passes, each feeding
//! [`clean`], and returns the first whose cleaned output is long enough:
//!
//! 1. **Pair reassembly**: collect `(lead, trail)` pairs from the configured
//!    ranges into word segments and re-decode them from EUC-KR.
//! 2. **Hangul runs**: decode as lossy UTF-8 and keep runs of Hangul text.
//! 3. **Printable runs**: decode as lossy UTF-8 and keep printable runs
//!    longer than 10 chars that contain Hangul.
//!
//! ## Segments, not pairs
//!
//! Random binary data matches a `(lead, trail)` pair roughly once every
//! twenty bytes. Pass 1 keeps a segment only when it holds several pairs
//! split into at least two words by ASCII separators, which real text does
//! and compressed data practically never does.

use crate::pipeline::clean::clean;
use crate::script;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// Cleaned scanner output must be longer than this to be returned.
pub const MIN_CLEANED_CHARS: usize = 50;
/// Minimum `(lead, trail)` pairs in a kept segment.
pub const MIN_SEGMENT_PAIRS: usize = 4;
/// Minimum separator-delimited words in a kept segment.
pub const MIN_SEGMENT_WORDS: usize = 2;
/// Longer separator runs end the segment.
const MAX_SEPARATOR_RUN: usize = 2;
/// Printable runs must be longer than this.
const MIN_PRINTABLE_RUN: usize = 10;

/// Byte ranges of a legacy double-byte Hangul pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRanges {
    pub lead: RangeInclusive<u8>,
    pub trail: RangeInclusive<u8>,
}

impl Default for ScanRanges {
    /// The KS X 1001 Hangul block.
    fn default() -> Self {
        Self {
            lead: 0xB0..=0xD3,
            trail: 0xA1..=0xFE,
        }
    }
}

impl ScanRanges {
    fn is_pair(&self, lead: u8, trail: u8) -> bool {
        self.lead.contains(&lead) && self.trail.contains(&trail)
    }
}

/// Which scanner pass produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPass {
    PairReassembly,
    HangulRuns,
    PrintableRuns,
}

/// Run the three passes and return the first long-enough cleaned result.
pub fn scan(bytes: &[u8], ranges: &ScanRanges) -> Option<String> {
    scan_with_pass(bytes, ranges).map(|(_, text)| text)
}

/// Like [`scan`] but also reports the winning pass.
pub fn scan_with_pass(bytes: &[u8], ranges: &ScanRanges) -> Option<(ScanPass, String)> {
    let reassembled = reassemble_pairs(bytes, ranges);
    if !reassembled.is_empty() {
        let (decoded, _, _) = encoding_rs::EUC_KR.decode(&reassembled);
        if let Some(text) = accept(&decoded) {
            return Some((ScanPass::PairReassembly, text));
        }
    }

    let lossy = String::from_utf8_lossy(bytes);

    if let Some(text) = accept(&hangul_runs(&lossy)) {
        return Some((ScanPass::HangulRuns, text));
    }

    if let Some(text) = accept(&printable_runs(&lossy)) {
        return Some((ScanPass::PrintableRuns, text));
    }

    debug!(len = bytes.len(), "scan: no pass produced enough text");
    None
}

fn accept(candidate: &str) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    let cleaned = clean(candidate);
    (cleaned.chars().count() > MIN_CLEANED_CHARS).then_some(cleaned)
}

// ── Pass 1: pair reassembly ──────────────────────────────────────────────────

fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'\t' | b'\r' | b'\n' | b'.' | b',' | b'!' | b'?' | b'(' | b')' | b'\'' | b'"'
    )
}

/// Accumulates one candidate segment of pairs and separators.
#[derive(Default)]
struct Segment {
    bytes: Vec<u8>,
    pending: Vec<u8>,
    pairs: usize,
    words: usize,
    in_word: bool,
}

impl Segment {
    fn push_pair(&mut self, lead: u8, trail: u8) {
        if self.pairs > 0 {
            self.bytes.append(&mut self.pending);
        }
        self.pending.clear();
        if !self.in_word {
            self.words += 1;
            self.in_word = true;
        }
        self.bytes.push(lead);
        self.bytes.push(trail);
        self.pairs += 1;
    }

    /// Returns `false` when the separator run is too long to continue.
    fn push_separator(&mut self, b: u8) -> bool {
        if self.pending.len() >= MAX_SEPARATOR_RUN {
            return false;
        }
        self.pending.push(b);
        self.in_word = false;
        true
    }

    fn flush_into(&mut self, out: &mut Vec<u8>) {
        if self.pairs >= MIN_SEGMENT_PAIRS && self.words >= MIN_SEGMENT_WORDS {
            out.append(&mut self.bytes);
            // Keep sentence punctuation so the filter can still split.
            out.extend(self.pending.iter().copied().filter(|b| matches!(b, b'.' | b'!' | b'?')));
            out.push(b' ');
        }
        *self = Segment::default();
    }
}

/// Collect in-range byte pairs into segments, dropping isolated hits.
fn reassemble_pairs(bytes: &[u8], ranges: &ScanRanges) -> Vec<u8> {
    let mut out = Vec::new();
    let mut segment = Segment::default();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if i + 1 < bytes.len() && ranges.is_pair(b, bytes[i + 1]) {
            segment.push_pair(b, bytes[i + 1]);
            i += 2;
            continue;
        }
        if segment.pairs > 0 && is_separator(b) && segment.push_separator(b) {
            i += 1;
            continue;
        }
        segment.flush_into(&mut out);
        i += 1;
    }
    segment.flush_into(&mut out);
    out
}

// ── Pass 2: Hangul runs ──────────────────────────────────────────────────────

static RE_HANGUL_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{AC00}-\x{D7A3}\x{3131}-\x{318E}]+(?:[ \t.,!?]+[\x{AC00}-\x{D7A3}\x{3131}-\x{318E}]+)*").unwrap()
});

fn hangul_runs(text: &str) -> String {
    RE_HANGUL_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Pass 3: printable runs ───────────────────────────────────────────────────

fn is_printable(c: char) -> bool {
    matches!(c, ' '..='~' | '\t' | '\n' | '\r') || script::is_hangul(c)
}

fn printable_runs(text: &str) -> String {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;
    for c in text.chars().chain(std::iter::once('\0')) {
        if is_printable(c) {
            current.push(c);
            len += 1;
            continue;
        }
        if len > MIN_PRINTABLE_RUN && script::contains_hangul(&current) {
            runs.push(std::mem::take(&mut current));
        } else {
            current.clear();
        }
        len = 0;
    }
    runs.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROSE: &str = "오늘은 날씨가 정말 좋습니다. 우리는 공원에 가서 오래 산책을 했습니다. \
        점심으로 김밥과 떡볶이를 먹었습니다. 저녁에는 가족과 함께 영화를 보았습니다.";

    fn noise(len: usize) -> Vec<u8> {
        // Bytes outside both pair ranges and outside ASCII separators.
        [0x00u8, 0x01, 0x7F, 0xFF, 0x13, 0x80].iter().copied().cycle().take(len).collect()
    }

    #[test]
    fn euc_kr_text_in_binary_is_reassembled() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode(PROSE);
        let mut bytes = noise(64);
        bytes.extend_from_slice(&encoded);
        bytes.extend(noise(64));

        let (pass, text) = scan_with_pass(&bytes, &ScanRanges::default()).expect("should scan");
        assert_eq!(pass, ScanPass::PairReassembly);
        assert!(text.contains("공원에 가서"), "got: {text}");
        assert!(text.contains("영화를 보았습니다"), "got: {text}");
    }

    #[test]
    fn isolated_pairs_are_ignored() {
        let mut bytes = Vec::new();
        for _ in 0..500 {
            bytes.extend_from_slice(&[0xB0, 0xA1, 0x00, 0x01]);
        }
        assert!(reassemble_pairs(&bytes, &ScanRanges::default()).is_empty());
        assert_eq!(scan(&bytes, &ScanRanges::default()), None);
    }

    #[test]
    fn utf8_text_falls_through_to_hangul_runs() {
        let mut bytes = noise(32);
        bytes.extend_from_slice(PROSE.as_bytes());
        bytes.extend(noise(32));
        let text = scan(&bytes, &ScanRanges::default()).expect("should scan");
        assert!(text.contains("김밥과 떡볶이를"), "got: {text}");
    }

    #[test]
    fn printable_runs_keep_only_hangul_runs() {
        let runs = printable_runs("abc\u{0}제목 없는 문서입니다\u{0}plain ascii only\u{0}");
        assert_eq!(runs, "제목 없는 문서입니다");
    }

    #[test]
    fn custom_ranges_are_respected() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode(PROSE);
        let narrow = ScanRanges {
            lead: 0xF0..=0xF1,
            trail: 0xA1..=0xFE,
        };
        assert!(reassemble_pairs(&encoded, &narrow).is_empty());
    }

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(scan(&[], &ScanRanges::default()), None);
    }
}
