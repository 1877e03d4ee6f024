//! Garbage filter: turn noisy decoded bytes into plausible Korean sentences.
//!
//! Every recovery strategy (and the raw scanner and probe passes) pushes its
//! output through [`clean`]. Binary containers leak stream names, hex dumps,
//! timestamps and symbol soup into any naive decode; the rules below strip
//! those artefacts and keep only sentences that look like real Korean prose.
//!
//! ## Rule order
//!
//! Rules 1–7 rewrite characters and are repeated until the text stops
//! changing, because removing one artefact can expose another (a stripped
//! hex run can leave two Latin words adjacent). Rules 8–10 then work on
//! whole sentences. Running to a fixpoint first is what makes
//! `clean(clean(x)) == clean(x)` hold.

use crate::script;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentences shorter than this (in chars) are dropped.
pub const MIN_SENTENCE_CHARS: usize = 10;
/// Minimum Hangul syllables for a sentence to survive.
pub const MIN_SENTENCE_SYLLABLES: usize = 3;
/// A run of this many isolated jamo marks a mis-decode.
pub const MAX_JAMO_RUN: usize = 3;
/// Longest unbroken syllable run a real sentence contains.
pub const MAX_WORD_SYLLABLES: usize = 24;

const MAX_PASSES: usize = 16;

/// Apply the full filter. Returns an empty string when nothing plausible remains.
///
/// Rules (applied in order):
/// 1. Blank out alphanumeric runs of 15+ chars (hashes, GUIDs, base64)
/// 2. Blank out hex runs of 8+ digits, with or without `0x`
/// 3. Blank out phrases of two or more Latin words (container metadata)
/// 4. Remove symbol runs of 5+ glued to alphanumerics, with the glued token
/// 5. Remove HWP container stream names and signatures
/// 6. Remove dates and clock times
/// 7. Replace characters outside the allowed set, collapse whitespace
/// 8. Split into sentences on `.`, `!`, `?` and line breaks
/// 9. Drop implausible sentences (length, syllables, jamo runs, soup)
/// 10. Deduplicate and join with `". "`
pub fn clean(input: &str) -> String {
    let normalised = normalise_to_fixpoint(input);
    let mut kept: Vec<&str> = Vec::new();
    for sentence in split_sentences(&normalised) {
        if is_plausible_sentence(sentence) && !kept.contains(&sentence) {
            kept.push(sentence);
        }
    }
    kept.join(". ")
}

/// Character-level rules 1–7, repeated until the text is stable.
fn normalise_to_fixpoint(input: &str) -> String {
    let mut current = normalise_once(input);
    for _ in 0..MAX_PASSES {
        let next = normalise_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalise_once(input: &str) -> String {
    let s = strip_alnum_runs(input);
    let s = strip_hex_runs(&s);
    let s = strip_latin_phrases(&s);
    let s = strip_symbol_runs(&s);
    let s = strip_container_tokens(&s);
    let s = strip_timestamps(&s);
    replace_disallowed(&s)
}

// ── Rule 1: Long alphanumeric runs ───────────────────────────────────────────

static RE_ALNUM_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]{15,}").unwrap());

/// Also used by the quality gate to penalise runs before scoring.
pub(crate) fn strip_alnum_runs(input: &str) -> String {
    RE_ALNUM_RUN.replace_all(input, " ").into_owned()
}

// ── Rule 2: Hex runs ─────────────────────────────────────────────────────────

static RE_HEX_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:0[xX])?[0-9A-Fa-f]{8,}\b").unwrap());

fn strip_hex_runs(input: &str) -> String {
    RE_HEX_RUN.replace_all(input, " ").into_owned()
}

// ── Rule 3: Latin phrases ────────────────────────────────────────────────────

static RE_LATIN_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+(?:[ \t]+[A-Za-z]+)+").unwrap());

fn strip_latin_phrases(input: &str) -> String {
    RE_LATIN_PHRASE.replace_all(input, " ").into_owned()
}

// ── Rule 4: Symbol runs glued to alphanumerics ───────────────────────────────

// A "symbol" is anything that is not whitespace, ASCII alphanumeric, Hangul,
// or sentence punctuation.
static RE_GLUED_SYMBOLS: Lazy<Regex> = Lazy::new(|| {
    let sym = r"[^\sA-Za-z0-9\x{1100}-\x{11FF}\x{3131}-\x{318E}\x{AC00}-\x{D7A3}.!?]";
    Regex::new(&format!(
        r"[A-Za-z0-9]+{sym}{{5,}}[A-Za-z0-9]*|{sym}{{5,}}[A-Za-z0-9]+"
    ))
    .unwrap()
});

fn strip_symbol_runs(input: &str) -> String {
    RE_GLUED_SYMBOLS.replace_all(input, " ").into_owned()
}

// ── Rule 5: Container stream names ───────────────────────────────────────────

static RE_CONTAINER_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"HwpSummaryInformation|FileHeader|DocInfo|BodyText|ViewText|",
        r"Section\d+|PrvText|PrvImage|BinData|DocOptions|_LinkDoc|",
        r"JScriptVersion|DefaultJScript|Scripts|HWP Document File"
    ))
    .unwrap()
});

fn strip_container_tokens(input: &str) -> String {
    RE_CONTAINER_TOKENS.replace_all(input, " ").into_owned()
}

// ── Rule 6: Dates and times ──────────────────────────────────────────────────

static RE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}[-./]\d{1,2}[-./]\d{1,2}|\d{1,2}:\d{2}(?::\d{2})?").unwrap()
});

fn strip_timestamps(input: &str) -> String {
    RE_TIMESTAMP.replace_all(input, " ").into_owned()
}

// ── Rule 7: Allowed character set + whitespace ───────────────────────────────

static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\x{AC00}-\x{D7A3}\x{3131}-\x{318E}\x{1100}-\x{11FF}A-Za-z0-9\s.,!?()'"%:~\-]"#)
        .unwrap()
});
static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

fn replace_disallowed(input: &str) -> String {
    let s = RE_DISALLOWED.replace_all(input, " ");
    let s = RE_LINE_BREAKS.replace_all(&s, "\n");
    RE_SPACES.replace_all(&s, " ").into_owned()
}

// ── Rule 8: Sentence split ───────────────────────────────────────────────────

fn split_sentences(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// ── Rule 9: Sentence plausibility ────────────────────────────────────────────

fn is_plausible_sentence(sentence: &str) -> bool {
    sentence.chars().count() >= MIN_SENTENCE_CHARS
        && script::count_syllables(sentence) >= MIN_SENTENCE_SYLLABLES
        && script::longest_jamo_run(sentence) < MAX_JAMO_RUN
        && (2..=MAX_WORD_SYLLABLES).contains(&script::longest_syllable_run(sentence))
}

// ── Tests ────────────────────────────────────────────────────────────────────
