//! Pulling the fumen body out of pasted text
//!
//! Accepts bare data, `v115@data`, or a whole URL such as
//! `https://fumen.zui.jp/?v115@vhAAgH&lang=ja`. Line wraps and the `?`
//! separators some sites insert every few dozen characters are dropped.

use fumen_core::FormatError;

/// The only version this codec reads and writes
pub const VERSION: &str = "115";

/// Prefix written in front of encoded data
pub const PREFIX: &str = "v115@";

/// Find the first `<v|m|d><digits>@` token; returns (version, data start)
fn find_version(input: &str) -> Option<(&str, usize)> {
    let bytes = input.as_bytes();
    for (at, _) in input.match_indices('@') {
        let digits_start = bytes[..at]
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map_or(0, |p| p + 1);
        if digits_start == at || digits_start == 0 {
            continue;
        }
        if matches!(bytes[digits_start - 1], b'v' | b'm' | b'd') {
            return Some((&input[digits_start..at], at + 1));
        }
    }
    None
}

/// Strip prefix and noise and return the raw symbol string
///
/// ```
/// use fumen_codec::extract;
///
/// assert_eq!(extract("v115@vhAAgH").unwrap(), "vhAAgH");
/// assert_eq!(extract("http://fumen.zui.jp/?v115@vh\nAA?gH&dummy").unwrap(), "vhAAgH");
/// assert!(extract("v110@vhAAgH").is_err());
/// ```
pub fn extract(input: &str) -> Result<String, FormatError> {
    let data = match find_version(input) {
        Some((version, start)) if version == VERSION => &input[start..],
        Some((version, _)) => return Err(FormatError::UnsupportedVersion(version.to_string())),
        None => input,
    };
    let data = data.split('&').next().unwrap_or_default();

    Ok(data
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '?')
        .collect())
}
