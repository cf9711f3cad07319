//! Comment codec
//!
//! Comments are percent-escaped into printable ASCII, then packed four
//! characters per 5-symbol group using the 95-entry table below with radix 96.
//!
//! Escaping follows the classic URL `escape` rules: ASCII letters, digits and
//! `@*_+-./` stay as is; other UTF-16 code units become `%XX` below 256 and
//! `%uXXXX` otherwise.

use crate::error::FormatError;
use crate::values::Values;

/// Printable ASCII, space through `~`
pub const COMMENT_TABLE: &[u8; 95] = b" !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Radix of one packed comment character, one past the table
pub const COMMENT_RADIX: u32 = COMMENT_TABLE.len() as u32 + 1;

/// Characters packed per group
pub const CHARS_PER_GROUP: usize = 4;

/// Symbols per packed group
pub const GROUP_SYMBOLS: usize = 5;

/// Symbols holding the escaped length
pub const LENGTH_SYMBOLS: usize = 2;

fn is_unescaped(c: u16) -> bool {
    match u8::try_from(c) {
        Ok(b) => b.is_ascii_alphanumeric() || b"@*_+-./".contains(&b),
        Err(_) => false,
    }
}

/// Percent-escape a comment
///
/// ```
/// use fumen_core::comment::escape;
///
/// assert_eq!(escape("a b"), "a%20b");
/// assert_eq!(escape("#Q=[](T)"), "%23Q%3D%5B%5D%28T%29");
/// assert_eq!(escape("テ"), "%u30C6");
/// ```
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        escape_char(c, &mut out);
    }
    out
}

fn escape_char(c: char, out: &mut String) {
    let mut buf = [0u16; 2];
    for &unit in c.encode_utf16(&mut buf).iter() {
        if is_unescaped(unit) {
            out.push(unit as u8 as char);
        } else if unit < 256 {
            out.push_str(&format!("%{:02X}", unit));
        } else {
            out.push_str(&format!("%u{:04X}", unit));
        }
    }
}

/// Escape as many whole characters as fit in `max` escaped bytes
fn escape_prefix(text: &str, max: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max));
    let mut segment = String::new();
    for c in text.chars() {
        segment.clear();
        escape_char(c, &mut segment);
        if out.len() + segment.len() > max {
            break;
        }
        out.push_str(&segment);
    }
    out
}

/// Reverse of [`escape`]
///
/// Malformed escape sequences are kept literally.
pub fn unescape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let hex = |slice: &[char]| -> Option<u16> {
        let s: String = slice.iter().collect();
        u16::from_str_radix(&s, 16).ok()
    };

    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%' {
            if chars.get(i + 1) == Some(&'u') && i + 6 <= chars.len() {
                if let Some(unit) = hex(&chars[i + 2..i + 6]) {
                    units.push(unit);
                    i += 6;
                    continue;
                }
            }
            if i + 3 <= chars.len() {
                if let Some(unit) = hex(&chars[i + 1..i + 3]) {
                    units.push(unit);
                    i += 3;
                    continue;
                }
            }
        }
        let mut buf = [0u16; 2];
        units.extend_from_slice(chars[i].encode_utf16(&mut buf));
        i += 1;
    }
    String::from_utf16_lossy(&units)
}

fn char_value(c: char) -> Result<u32, FormatError> {
    COMMENT_TABLE
        .iter()
        .position(|&b| b as char == c)
        .map(|p| p as u32)
        .ok_or(FormatError::InvalidCommentChar(c as u32))
}

/// Read one comment body (length + groups) and unescape it
pub fn decode_comment(values: &mut Values) -> Result<String, FormatError> {
    let length = values.poll(LENGTH_SYMBOLS)? as usize;
    let groups = length.div_ceil(CHARS_PER_GROUP);

    let mut flat = String::with_capacity(groups * CHARS_PER_GROUP);
    for _ in 0..groups {
        let mut value = values.poll(GROUP_SYMBOLS)?;
        for _ in 0..CHARS_PER_GROUP {
            let code = value % COMMENT_RADIX;
            value /= COMMENT_RADIX;
            if flat.len() < length {
                let c = COMMENT_TABLE
                    .get(code as usize)
                    .ok_or(FormatError::InvalidCommentChar(code))?;
                flat.push(*c as char);
            }
        }
    }
    Ok(unescape(&flat))
}

/// Escape and write one comment body
///
/// Text whose escaped form is longer than the 2-symbol length field allows
/// is cut after the last character that fits whole.
pub fn encode_comment(text: &str, values: &mut Values) -> Result<(), FormatError> {
    let escaped = escape_prefix(text, crate::types::MAX_COMMENT_LENGTH);
    values.push(escaped.len() as u32, LENGTH_SYMBOLS);

    for chunk in escaped.as_bytes().chunks(CHARS_PER_GROUP) {
        let mut value = 0u32;
        let mut weight = 1u32;
        for &b in chunk {
            value += char_value(b as char)? * weight;
            weight *= COMMENT_RADIX;
        }
        values.push(value, GROUP_SYMBOLS);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(text: &str) -> String {
        let mut values = Values::new();
        encode_comment(text, &mut values).unwrap();
        let mut parsed = Values::parse(&values.to_string()).unwrap();
        let decoded = decode_comment(&mut parsed).unwrap();
        assert!(parsed.is_empty());
        decoded
    }

    #[test]
    fn table_is_printable_ascii() {
        assert_eq!(COMMENT_TABLE[0], b' ');
        assert_eq!(COMMENT_TABLE[94], b'~');
        assert_eq!(COMMENT_RADIX, 96);
    }

    #[test]
    fn group_packs_characters_in_radix_96() {
        let mut values = Values::new();
        encode_comment("ab", &mut values).unwrap();
        // length 2, then 65 + 66 * 96 = 6401 over five symbols
        assert_eq!(values.to_string(), "CABkBAA");

        let mut values = Values::new();
        encode_comment("~~~~", &mut values).unwrap();
        // 94 * (1 + 96 + 96^2 + 96^3)
        let mut parsed = Values::parse(&values.to_string()).unwrap();
        assert_eq!(parsed.poll(LENGTH_SYMBOLS).unwrap(), 4);
        assert_eq!(parsed.poll(GROUP_SYMBOLS).unwrap(), 84_040_606);
    }

    #[test]
    fn long_comment_is_cut_between_characters() {
        let max = crate::types::MAX_COMMENT_LENGTH;
        let text = format!("{}テ", "a".repeat(max - 2));
        // "%u30C6" would not fit in the two bytes left
        assert_eq!(roundtrip(&text), "a".repeat(max - 2));

        let text = format!("{}テ", "a".repeat(max - 6));
        assert_eq!(roundtrip(&text), text);

        let emoji = "🙂".repeat(400);
        let decoded = roundtrip(&emoji);
        assert!(!decoded.contains('\u{FFFD}'));
        assert_eq!(decoded, "🙂".repeat(max / 12));
    }

    #[test]
    fn escape_latin1_and_unicode() {
        assert_eq!(escape("é"), "%E9");
        assert_eq!(unescape("%E9"), "é");
        assert_eq!(unescape(&escape("日本語 テスト")), "日本語 テスト");
        assert_eq!(unescape(&escape("🙂")), "🙂");
    }

    #[test]
    fn unescape_keeps_malformed_sequences() {
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("%zz"), "%zz");
        assert_eq!(unescape("%u12"), "%u12");
    }

    #[test]
    fn comment_roundtrips() {
        assert_eq!(roundtrip(""), "");
        assert_eq!(roundtrip("hello"), "hello");
        assert_eq!(roundtrip("#Q=[T](I)SZOJL"), "#Q=[T](I)SZOJL");
        assert_eq!(roundtrip("perfect clear ✔"), "perfect clear ✔");
    }

    #[test]
    fn group_count_follows_escaped_length() {
        let mut values = Values::new();
        encode_comment("hello", &mut values).unwrap();
        // 2 length symbols + 2 groups of 5
        assert_eq!(values.len(), 12);
    }

    #[test]
    fn truncated_body_fails() {
        let mut values = Values::new();
        values.push(8, LENGTH_SYMBOLS);
        values.push(0, GROUP_SYMBOLS);
        let mut parsed = Values::parse(&values.to_string()).unwrap();
        assert!(matches!(
            decode_comment(&mut parsed),
            Err(FormatError::Truncated { .. })
        ));
    }
}
