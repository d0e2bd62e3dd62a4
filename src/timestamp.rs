// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Best-effort conversion of export timestamps into epoch seconds.
//!
//! Discord exports are not consistent about how they store timestamps: some
//! tools write ISO-8601 strings, others write epoch seconds or milliseconds
//! as numbers or as strings. [`to_epoch_seconds`] accepts all of them and
//! falls back to `0` instead of failing.
//!
//! # Example
//!
//! ```
//! use dc2slack::timestamp::{RawTimestamp, to_epoch_seconds};
//!
//! let raw = RawTimestamp::Text("2021-01-01T00:00:00Z".into());
//! assert_eq!(to_epoch_seconds(&raw), 1_609_459_200);
//!
//! let raw = RawTimestamp::Text("1609459200000".into());
//! assert_eq!(to_epoch_seconds(&raw), 1_609_459_200);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Values above this are read as milliseconds rather than seconds.
const MILLIS_THRESHOLD: u128 = 1_000_000_000_000;

/// Offset-bearing layouts tried after RFC 3339, extended and basic forms.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y%m%dT%H%M%S%.f%:z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%:z",
];

/// Naive date-time layouts tried after the offset ones, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Hour-precision times (`2021-01-01T05`, optionally with an offset).
static HOUR_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}[T ]\d{2})([+-]\d{2}:?\d{2})?$").expect("valid regex")
});

/// A timestamp as it appeared in the export, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawTimestamp {
    /// The field was absent, null, or otherwise empty.
    #[default]
    Missing,
    /// An integral JSON number.
    Integer(i64),
    /// A fractional JSON number (or an integer too large for `i64`).
    Float(f64),
    /// Any textual representation.
    Text(String),
}

impl From<&Value> for RawTimestamp {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => Self::Missing,
            Value::Bool(true) => Self::Integer(1),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(0.0)), Self::Integer),
            Value::String(s) if s.is_empty() => Self::Missing,
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(a) if a.is_empty() => Self::Missing,
            Value::Object(o) if o.is_empty() => Self::Missing,
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<Option<&Value>> for RawTimestamp {
    fn from(value: Option<&Value>) -> Self {
        value.map_or(Self::Missing, Self::from)
    }
}

/// Converts a raw export timestamp into epoch seconds (UTC).
///
/// Numbers are taken as epoch seconds and truncated. Strings are parsed as
/// ISO-8601 first (a trailing `Z` means UTC and naive values are assumed to
/// be UTC). If that fails, every non-digit is stripped and the remaining
/// number is used, divided by 1000 when it is too large to be seconds.
///
/// Anything that cannot be interpreted yields `0`. Instants before the epoch
/// clamp to `0` as well.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_epoch_seconds(raw: &RawTimestamp) -> u64 {
    match raw {
        RawTimestamp::Missing => 0,
        RawTimestamp::Integer(n) => u64::try_from(*n).unwrap_or(0),
        // Float-to-int casts saturate, and NaN becomes 0.
        RawTimestamp::Float(f) => f.trunc() as u64,
        RawTimestamp::Text(s) => parse_iso8601(s)
            .or_else(|| parse_digits(s))
            .unwrap_or(0),
    }
}

/// Parses an ISO-8601 date, date-time, or date-time with offset.
///
/// A trailing `Z` is rewritten to `+00:00` first, so both spellings of UTC
/// always agree.
fn parse_iso8601(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let s = match s.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_owned(),
    };
    // chrono needs a minute field, so hour-only times get `:00` appended.
    let s = HOUR_ONLY_RE.replace(&s, "${1}:00${2}");

    let seconds = if let Some(dt) = DateTime::parse_from_rfc3339(&s).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
    }) {
        dt.timestamp()
    } else if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
    {
        naive.and_utc().timestamp()
    } else {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp()
    };

    Some(u64::try_from(seconds).unwrap_or(0))
}

/// Reads the digits of `s` as one number, treating large values as millis.
fn parse_digits(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    let n: u128 = digits.parse().ok()?;
    let seconds = if n > MILLIS_THRESHOLD { n / 1000 } else { n };
    u64::try_from(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> RawTimestamp {
        RawTimestamp::Text(s.into())
    }

    #[test]
    fn integer_is_returned_directly() {
        assert_eq!(to_epoch_seconds(&RawTimestamp::Integer(1_609_459_200)), 1_609_459_200);
    }

    #[test]
    fn float_is_truncated() {
        assert_eq!(to_epoch_seconds(&RawTimestamp::Float(1_609_459_200.9)), 1_609_459_200);
    }

    #[test]
    fn negative_numbers_clamp_to_zero() {
        assert_eq!(to_epoch_seconds(&RawTimestamp::Integer(-5)), 0);
        assert_eq!(to_epoch_seconds(&RawTimestamp::Float(-5.5)), 0);
    }

    #[test]
    fn missing_is_zero() {
        assert_eq!(to_epoch_seconds(&RawTimestamp::Missing), 0);
    }

    #[test]
    fn zulu_suffix_matches_explicit_utc_offset() {
        let zulu = to_epoch_seconds(&text("2021-01-01T00:00:00Z"));
        let offset = to_epoch_seconds(&text("2021-01-01T00:00:00+00:00"));
        assert_eq!(zulu, 1_609_459_200);
        assert_eq!(zulu, offset);
    }

    #[test]
    fn reduced_precision_and_basic_forms_agree() {
        for input in [
            "2021-01-01T00:00Z",
            "2021-01-01T00:00+00:00",
            "2021-01-01T00:00:00+0000",
            "2021-01-01T00Z",
            "2021-01-01T00+00:00",
            "2021-01-01T00",
            "20210101T000000Z",
            "20210101T000000",
            "20210101T0000Z",
            "2021-01-01 00:00:00+00:00",
        ] {
            assert_eq!(to_epoch_seconds(&text(input)), 1_609_459_200, "{input}");
        }
    }

    #[test]
    fn lowercase_zulu_is_utc() {
        assert_eq!(to_epoch_seconds(&text("2021-01-01T00:00:00z")), 1_609_459_200);
    }

    #[test]
    fn honors_offsets_at_minute_precision() {
        assert_eq!(to_epoch_seconds(&text("2021-01-01T02:00+02:00")), 1_609_459_200);
        assert_eq!(to_epoch_seconds(&text("2021-01-01T02+0200")), 1_609_459_200);
    }

    #[test]
    fn honors_non_utc_offsets() {
        assert_eq!(
            to_epoch_seconds(&text("2021-01-01T02:00:00+02:00")),
            1_609_459_200
        );
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(
            to_epoch_seconds(&text("2021-01-01T00:00:00.123456+00:00")),
            1_609_459_200
        );
    }

    #[test]
    fn naive_datetime_is_utc() {
        assert_eq!(to_epoch_seconds(&text("2021-01-01T00:00:00")), 1_609_459_200);
        assert_eq!(to_epoch_seconds(&text("2021-01-01 00:00:00")), 1_609_459_200);
        assert_eq!(to_epoch_seconds(&text("2021-01-01T00:00")), 1_609_459_200);
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        assert_eq!(to_epoch_seconds(&text("2021-01-01")), 1_609_459_200);
    }

    #[test]
    fn digit_string_is_seconds() {
        assert_eq!(to_epoch_seconds(&text("1609459200")), 1_609_459_200);
    }

    #[test]
    fn large_digit_string_is_milliseconds() {
        assert_eq!(to_epoch_seconds(&text("1609459200123")), 1_609_459_200);
    }

    #[test]
    fn threshold_itself_is_still_seconds() {
        assert_eq!(to_epoch_seconds(&text("1000000000000")), 1_000_000_000_000);
    }

    #[test]
    fn strips_non_digits_before_fallback() {
        // Not valid ISO, so the digits are read as one number.
        assert_eq!(to_epoch_seconds(&text("ts: 1609459200 s")), 1_609_459_200);
    }

    #[test]
    fn unparseable_text_is_zero() {
        assert_eq!(to_epoch_seconds(&text("yesterday")), 0);
        assert_eq!(to_epoch_seconds(&text("")), 0);
        assert_eq!(to_epoch_seconds(&text("   ")), 0);
    }

    #[test]
    fn absurdly_long_digit_runs_are_zero() {
        let digits = "9".repeat(60);
        assert_eq!(to_epoch_seconds(&text(&digits)), 0);
    }

    #[test]
    fn builds_from_json_values() {
        assert_eq!(RawTimestamp::from(&json!(null)), RawTimestamp::Missing);
        assert_eq!(RawTimestamp::from(&json!("")), RawTimestamp::Missing);
        assert_eq!(RawTimestamp::from(&json!(12)), RawTimestamp::Integer(12));
        assert_eq!(RawTimestamp::from(&json!(1.5)), RawTimestamp::Float(1.5));
        assert_eq!(RawTimestamp::from(&json!("x")), RawTimestamp::Text("x".into()));
        assert_eq!(RawTimestamp::from(None), RawTimestamp::Missing);
    }
}
