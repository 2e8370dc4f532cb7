//! Timestamp text helpers
//!
//! Timestamps travel as ISO-8601 strings with millisecond precision
//! (`2021-10-25T22:49:25.790Z`). A native string carrying that shape anywhere
//! inside it is treated as a timestamp by the classifier.

use chrono::{DateTime, SecondsFormat, Utc};

/// Length of `YYYY-MM-DDThh:mm:ss.sssZ`
const TIMESTAMP_LEN: usize = 24;

/// Format a date-time as ISO-8601 with millisecond precision and a `Z` suffix
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Check whether `text` contains the `YYYY-MM-DDThh:mm:ss.sssZ` pattern
///
/// The match is unanchored and the fractional separator may be any
/// character, so `"at 2021-10-25T22:49:25.790Z"` qualifies.
pub fn looks_like_timestamp(text: &str) -> bool {
    text.as_bytes()
        .windows(TIMESTAMP_LEN)
        .any(matches_timestamp_shape)
}

fn matches_timestamp_shape(window: &[u8]) -> bool {
    // 'D' digit, other bytes literal, '?' any single character
    const SHAPE: &[u8; TIMESTAMP_LEN] = b"DDDD-DD-DDTDD:DD:DD?DDDZ";

    SHAPE.iter().zip(window).all(|(shape, byte)| match shape {
        b'D' => byte.is_ascii_digit(),
        b'?' => *byte != b'\n',
        literal => literal == byte,
    })
}
