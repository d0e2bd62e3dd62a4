// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Text and identifier sanitization.
//!
//! Slack's CSV importer is picky: channel names and usernames must be plain
//! slugs, and message bodies must not carry mentions that would ping a whole
//! workspace or control characters that break the import. Every rule here is
//! a separate function so each can be tested on its own; [`sanitize_text`]
//! runs the message-body rules in order.
//!
//! None of these functions can fail. The worst case for odd input is an odd
//! but valid string.
//!
//! # Example
//!
//! ```
//! use dc2slack::sanitize::{sanitize_channel, sanitize_text, sanitize_username};
//!
//! assert_eq!(sanitize_text("ping @here"), "ping here");
//! assert_eq!(sanitize_channel("Dev Talk.v2"), "dev-talk-v2");
//! assert_eq!(sanitize_username("Bo#1"), "Bo_1");
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// Fallback channel when a name sanitizes to nothing.
pub const DEFAULT_CHANNEL: &str = "general";

/// Fallback username when a name sanitizes to nothing usable.
pub const DEFAULT_USERNAME: &str = "user_import";

/// Longest channel or username Slack accepts.
pub const MAX_IDENTIFIER_LEN: usize = 80;

/// Matches a valid channel slug.
pub static CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,80}$").expect("valid regex"));

/// Matches a valid username slug.
pub static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,80}$").expect("valid regex"));

static EVERYONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@everyone\b").expect("valid regex"));
static HERE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@here\b").expect("valid regex"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_.-]{1,80})").expect("valid regex"));

// A language tag only counts when the fence line ends right after it.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:\w*\r?\n)?").expect("valid regex"));

static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Cc}\p{Cf}\p{Co}&&[^\n\t]]").expect("valid regex")
});

static CHANNEL_DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid regex"));
static HYPHEN_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

static USER_LEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^A-Za-z0-9_]+").expect("valid regex"));
static USER_TRAILING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]+$").expect("valid regex"));
static USER_DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// Runs the full message-body pipeline.
///
/// The stages are, in order: [`soften_mentions`], [`strip_code_fences`],
/// and [`clean_text`].
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let text = soften_mentions(text);
    let text = strip_code_fences(&text);
    clean_text(&text)
}

/// Drops the `@` from mentions so the import does not notify anyone.
///
/// `@everyone` and `@here` become plain words, and any `@name` made of
/// letters, digits, `_`, `.`, or `-` loses its `@`.
#[must_use]
pub fn soften_mentions(text: &str) -> String {
    let text = EVERYONE_RE.replace_all(text, "everyone");
    let text = HERE_RE.replace_all(&text, "here");
    MENTION_RE.replace_all(&text, "${1}").into_owned()
}

/// Removes triple-backtick fences, keeping the fenced text.
///
/// An opening fence may carry a language tag (```` ```rust ````) and the
/// line ending after it (`\n` or `\r\n`); both are removed with the fence.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").replace("```", "")
}

/// Cleans stray quoting, escapes, line endings, and control characters.
///
/// Runs [`strip_outer_quotes`], [`unescape_sequences`],
/// [`normalize_newlines`], and [`remove_control_chars`] in that order.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let text = strip_outer_quotes(text);
    let text = unescape_sequences(text);
    let text = normalize_newlines(&text);
    remove_control_chars(&text)
}

/// Strips one pair of matching outer double or single quotes.
#[must_use]
pub fn strip_outer_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
        if text.len() == 1 && text.starts_with(quote) {
            return "";
        }
    }
    text
}

/// Turns literal escape sequences back into the characters they stand for.
///
/// Doubled-backslash forms (`\\n`) are handled before single ones (`\n`) so
/// the leftover backslash of a doubled form is never misread. Escaped quotes
/// lose their backslash.
#[must_use]
pub fn unescape_sequences(text: &str) -> String {
    text.replace(r"\\r\\n", "\n")
        .replace(r"\\n", "\n")
        .replace(r"\\r", "\r")
        .replace(r"\r\n", "\n")
        .replace(r"\n", "\n")
        .replace(r"\r", "\r")
        .replace(r#"\""#, "\"")
        .replace(r"\'", "'")
}

/// Converts `\r\n` and lone `\r` line endings to `\n`.
#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Removes control, format, and private-use characters except `\n` and `\t`.
///
/// This catches zero-width spaces, bidi overrides, and similar invisible
/// characters that confuse importers.
#[must_use]
pub fn remove_control_chars(text: &str) -> String {
    CONTROL_RE.replace_all(text, "").into_owned()
}

/// Normalizes a channel name into a Slack-safe slug.
///
/// The result always matches `^[a-z0-9_-]{1,80}$`; names that sanitize to
/// nothing become [`DEFAULT_CHANNEL`].
#[must_use]
pub fn sanitize_channel(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = lowered.trim().replace([' ', '.'], "-");
    let slug = CHANNEL_DISALLOWED_RE.replace_all(&slug, "-");
    let slug = HYPHEN_RUN_RE.replace_all(&slug, "-");
    let slug = truncate(slug.trim_matches('-'), MAX_IDENTIFIER_LEN);

    if slug.is_empty() {
        DEFAULT_CHANNEL.to_owned()
    } else {
        slug.to_owned()
    }
}

/// Normalizes a username into a Slack-safe slug.
///
/// Leading punctuation and trailing punctuation other than `.` and `-` are
/// dropped, and anything else outside `[A-Za-z0-9._-]` becomes `_`. Names
/// that end up empty or not starting with a letter or digit become
/// [`DEFAULT_USERNAME`].
#[must_use]
pub fn sanitize_username(name: &str) -> String {
    let name = USER_LEADING_RE.replace(name.trim(), "");
    let name = USER_TRAILING_RE.replace(&name, "");
    let name = USER_DISALLOWED_RE.replace_all(&name, "_");

    if name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        truncate(&name, MAX_IDENTIFIER_LEN).to_owned()
    } else {
        DEFAULT_USERNAME.to_owned()
    }
}

/// Cuts `s` to at most `max` bytes. Only used on ASCII slugs.
fn truncate(s: &str, max: usize) -> &str {
    s.get(..max).unwrap_or(s)
}
