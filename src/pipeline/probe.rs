//! Encoding probe: last-resort decode of the whole buffer.
//!
//! Some files carrying an `.hwp` name are really plain text in a modern
//! encoding. The probe decodes the buffer under each candidate encoding and
//! keeps the first decode that holds real Hangul and survives the garbage
//! filter. The legacy double-byte code page is left to the scanner.

use crate::pipeline::clean::clean;
use crate::script;
use tracing::debug;

/// A decode needs more Hangul syllables than this to be cleaned at all.
pub const MIN_HANGUL: usize = 10;
/// A cleaned decode must be longer than this to be returned.
pub const MIN_CLEANED_CHARS: usize = 50;

/// Encodings tried by [`probe`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEncoding {
    Utf8,
    Latin1,
}

impl ProbeEncoding {
    pub const ORDER: [ProbeEncoding; 2] = [ProbeEncoding::Utf8, ProbeEncoding::Latin1];

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            ProbeEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            ProbeEncoding::Latin1 => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        }
    }
}

/// Return the first cleaned decode that looks like Korean prose.
pub fn probe(bytes: &[u8]) -> Option<String> {
    for encoding in ProbeEncoding::ORDER {
        let decoded = encoding.decode(bytes);
        let hangul = script::count_syllables(&decoded);
        if hangul <= MIN_HANGUL {
            debug!(?encoding, hangul, "probe: too little Hangul");
            continue;
        }
        let cleaned = clean(&decoded);
        if cleaned.chars().count() > MIN_CLEANED_CHARS {
            debug!(?encoding, chars = cleaned.chars().count(), "probe: decode accepted");
            return Some(cleaned);
        }
        debug!(?encoding, "probe: cleaned decode too short");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROSE: &str = "오늘은 날씨가 정말 좋습니다. 우리는 공원에 가서 오래 산책을 했습니다. \
        점심으로 김밥과 떡볶이를 먹었습니다. 저녁에는 가족과 함께 영화를 보았습니다.";

    #[test]
    fn utf8_text_with_binary_noise_is_recovered() {
        let mut bytes = vec![0u8, 1, 2, 0xFF, 0xFE];
        bytes.extend_from_slice(PROSE.as_bytes());
        bytes.extend_from_slice(&[0, 0, 0x13, 0x37]);
        let text = probe(&bytes).expect("should decode");
        assert!(text.contains("공원에 가서"), "got: {text}");
    }

    #[test]
    fn binary_without_hangul_yields_none() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(probe(&bytes), None);
    }

    #[test]
    fn too_little_text_yields_none() {
        assert_eq!(probe("안녕하세요 반갑습니다 여러분".as_bytes()), None);
    }
}
