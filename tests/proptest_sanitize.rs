// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Property-based tests for sanitizers and timestamp parsing.
//!
//! Whatever the input, slugs must satisfy Slack's patterns and the
//! timestamp parser must return a value instead of panicking.

use dc2slack::parser::extract_messages;
use dc2slack::sanitize::{
    CHANNEL_RE, USERNAME_RE, sanitize_channel, sanitize_text, sanitize_username,
};
use dc2slack::timestamp::{RawTimestamp, to_epoch_seconds};
use proptest::prelude::*;
use serde_json::{Value, json};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Channel slugs always match the channel pattern.
    #[test]
    fn channel_slug_is_always_valid(input in ".*") {
        let slug = sanitize_channel(&input);
        prop_assert!(CHANNEL_RE.is_match(&slug), "{input:?} -> {slug:?}");
    }

    /// Username slugs always match the username pattern.
    #[test]
    fn username_slug_is_always_valid(input in ".*") {
        let slug = sanitize_username(&input);
        prop_assert!(USERNAME_RE.is_match(&slug), "{input:?} -> {slug:?}");
    }

    /// Pure punctuation never becomes a username.
    #[test]
    fn punctuation_username_is_default(input in "[!#$%^&*()+= ]{0,20}") {
        prop_assert_eq!(sanitize_username(&input), "user_import");
    }

    /// Clean text passes through the text pipeline unchanged.
    #[test]
    fn clean_text_is_fixed_point(input in "[A-Za-z0-9 ,.!?\n\t]{0,200}") {
        prop_assert_eq!(sanitize_text(&input), input);
    }

    /// The text pipeline never panics.
    #[test]
    fn text_pipeline_never_panics(input in "\\PC*") {
        let _ = sanitize_text(&input);
    }

    /// Timestamp parsing never panics on arbitrary text.
    #[test]
    fn timestamp_parse_never_panics(input in ".*") {
        let _ = to_epoch_seconds(&RawTimestamp::Text(input));
    }

    /// Text with no digits that is not a date parses to zero.
    #[test]
    fn digitless_text_is_zero(input in "[A-Za-z :/]{0,40}") {
        prop_assert_eq!(to_epoch_seconds(&RawTimestamp::Text(input)), 0);
    }

    /// `Z` and `+00:00` suffixes agree.
    #[test]
    fn zulu_matches_utc_offset(secs in 0i64..4_102_444_800) {
        let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap();
        let base = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
        let zulu = to_epoch_seconds(&RawTimestamp::Text(format!("{base}Z")));
        let offset = to_epoch_seconds(&RawTimestamp::Text(format!("{base}+00:00")));
        prop_assert_eq!(zulu, offset);
        prop_assert_eq!(zulu, u64::try_from(secs).unwrap());
    }

    /// `Z` and `+00:00` agree at minute and hour precision too.
    #[test]
    fn zulu_matches_utc_offset_at_reduced_precision(secs in 0i64..4_102_444_800) {
        let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap();
        for (layout, step) in [("%Y-%m-%dT%H:%M", 60), ("%Y-%m-%dT%H", 3600)] {
            let base = dt.format(layout).to_string();
            let zulu = to_epoch_seconds(&RawTimestamp::Text(format!("{base}Z")));
            let offset = to_epoch_seconds(&RawTimestamp::Text(format!("{base}+00:00")));
            prop_assert_eq!(zulu, offset, "{}", base);
            prop_assert_eq!(zulu, u64::try_from(secs - secs % step).unwrap());
        }
    }

    /// Re-extracting extracted messages gives the same list.
    #[test]
    fn extraction_is_idempotent(contents in prop::collection::vec("[a-z]{0,8}", 0..10)) {
        let doc = Value::Array(contents.iter().map(|c| json!({"content": c})).collect());
        let first: Vec<Value> = extract_messages(&doc)
            .into_iter()
            .map(|m| Value::Object(m.clone()))
            .collect();
        let wrapped = json!({"messages": first.clone()});
        let second: Vec<Value> = extract_messages(&wrapped)
            .into_iter()
            .map(|m| Value::Object(m.clone()))
            .collect();
        prop_assert_eq!(first, second);
    }
}
