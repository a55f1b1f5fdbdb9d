//! URL query decoding.
//!
//! The control page sends `key=value` pairs without any escaping, and the
//! device firmware compares values byte for byte. Decoding here is therefore
//! deliberately minimal:
//! - pairs are split on `&`, key and value on the first `=`
//! - no percent-decoding
//! - the first pair with a matching key wins
//! - values longer than [`MAX_VALUE_LEN`] count as absent

/// Longest value accepted. The device reads values into a 32-byte buffer,
/// anything longer is truncated there and dropped.
pub const MAX_VALUE_LEN: usize = 31;

/// Look up `key` in a raw query string (without the leading `?`).
///
/// A key without `=` does not match.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    let value = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)?;

    if value.len() > MAX_VALUE_LEN {
        log::debug!("dropping oversized '{key}' value ({} bytes)", value.len());
        return None;
    }
    Some(value)
}

/// Parse an integer the way C's `atoi` does.
///
/// Skips leading ASCII whitespace, accepts one optional sign, then consumes
/// decimal digits until the first non-digit. Returns 0 when no digits are
/// found. Saturates at the `i64` bounds instead of overflowing.
pub fn parse_leading_int(text: &str) -> i64 {
    let text = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}
