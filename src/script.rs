//! Hangul character classification.
//!
//! Every heuristic in the recovery pipeline measures "how Korean" a piece of
//! text is. These helpers are the single definition of that measure.

use std::ops::RangeInclusive;

/// Precomposed Hangul syllables (가–힣).
pub const SYLLABLES: RangeInclusive<char> = '\u{AC00}'..='\u{D7A3}';
/// Hangul Compatibility Jamo (ㄱ–ㆎ).
pub const COMPAT_JAMO: RangeInclusive<char> = '\u{3131}'..='\u{318E}';
/// Conjoining Hangul Jamo.
pub const CONJOINING_JAMO: RangeInclusive<char> = '\u{1100}'..='\u{11FF}';

pub fn is_syllable(c: char) -> bool {
    SYLLABLES.contains(&c)
}

/// Isolated consonant/vowel letters, compatibility or conjoining.
pub fn is_jamo(c: char) -> bool {
    COMPAT_JAMO.contains(&c) || CONJOINING_JAMO.contains(&c)
}

pub fn is_hangul(c: char) -> bool {
    is_syllable(c) || is_jamo(c)
}

/// Number of precomposed syllables in `text`.
pub fn count_syllables(text: &str) -> usize {
    text.chars().filter(|&c| is_syllable(c)).count()
}

pub fn contains_hangul(text: &str) -> bool {
    text.chars().any(is_hangul)
}

/// Length of the longest run of consecutive jamo.
pub fn longest_jamo_run(text: &str) -> usize {
    longest_run(text, is_jamo)
}

/// Length of the longest run of consecutive syllables.
pub fn longest_syllable_run(text: &str) -> usize {
    longest_run(text, is_syllable)
}

fn longest_run(text: &str, pred: impl Fn(char) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in text.chars() {
        if pred(c) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
