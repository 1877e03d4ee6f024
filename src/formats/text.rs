//! Plain-text decoding for TXT and CSV uploads.
//!
//! Korean text files in the wild are UTF-8, UTF-16 (Notepad "Unicode"), or
//! CP949 from older Excel/Windows exports. A BOM is trusted when present;
//! otherwise valid UTF-8 is used as-is and anything else is read as EUC-KR
//! (`encoding_rs` maps the label to windows-949, a CP949 superset).

use encoding_rs::{Encoding, EUC_KR, UTF_8};

/// Decode `bytes` to a `String`, never failing.
pub fn decode(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    let (text, _, had_errors) = EUC_KR.decode(bytes);
    if had_errors {
        // Neither UTF-8 nor CP949: keep what UTF-8 can salvage.
        return UTF_8.decode(bytes).0.into_owned();
    }
    text.into_owned()
}
