// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Turning parsed messages into import rows.
//!
//! Each chat message becomes one [`Row`]: a timestamp, a channel, a
//! username, and the message text with attachment links appended. The
//! channel is chosen by priority:
//!
//! 1. A forced channel given on the command line
//! 2. A channel map entry for the message's `channel_id`
//! 3. The export's file name, minus `.json` and any `_page…` suffix
//!
//! Whatever the source, the channel is always passed through
//! [`sanitize_channel`].
//!
//! # Example
//!
//! ```
//! use dc2slack::rows::{RowBuilder, rows_from_json};
//! use std::path::Path;
//!
//! let json = r#"[{"timestamp": 1609459200, "content": "hi", "userName": "bo"}]"#;
//! let rows = rows_from_json(Path::new("random.json"), json, &RowBuilder::default()).unwrap();
//!
//! assert_eq!(rows[0].channel, "random");
//! assert_eq!(rows[0].text, "hi");
//! ```

use crate::channel_map::ChannelMap;
use crate::parser::{self, Attachment, MessageRecord, ParseError};
use crate::sanitize::{DEFAULT_USERNAME, sanitize_channel, sanitize_text, sanitize_username};
use crate::timestamp::to_epoch_seconds;
use serde::Serialize;
use std::path::Path;

/// One line of the Slack import CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Seconds since the Unix epoch (UTC).
    pub timestamp: u64,
    /// Destination channel slug.
    pub channel: String,
    /// Author username slug.
    pub username: String,
    /// Sanitized message text, possibly spanning several lines.
    pub text: String,
}

/// Builds [`Row`]s from message records.
///
/// Holds the channel settings that apply to a whole run.
#[derive(Debug, Clone, Default)]
pub struct RowBuilder {
    forced_channel: Option<String>,
    channel_map: ChannelMap,
}

impl RowBuilder {
    /// Creates a builder with no forced channel and an empty channel map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends every message to `channel`, ignoring the map and file names.
    #[must_use]
    pub fn with_forced_channel(mut self, channel: impl Into<String>) -> Self {
        let channel: String = channel.into();
        self.forced_channel = (!channel.is_empty()).then_some(channel);
        self
    }

    /// Uses `map` to translate source channel ids into channel names.
    #[must_use]
    pub fn with_channel_map(mut self, map: ChannelMap) -> Self {
        self.channel_map = map;
        self
    }

    /// Builds rows for every chat message, skipping non-chat messages.
    ///
    /// `source` is the export file the messages came from; it names the
    /// channel when nothing else does.
    #[must_use]
    pub fn build_rows(&self, source: &Path, records: &[MessageRecord]) -> Vec<Row> {
        records
            .iter()
            .filter_map(|record| self.build_row(source, record))
            .collect()
    }

    /// Builds the row for one message, or `None` for a non-chat message.
    #[must_use]
    pub fn build_row(&self, source: &Path, record: &MessageRecord) -> Option<Row> {
        if !record.is_chat() {
            return None;
        }

        let username = sanitize_username(record.username().unwrap_or(DEFAULT_USERNAME));
        let channel = sanitize_channel(&self.resolve_channel(source, record));

        let mut text = sanitize_text(record.content());
        let extra = render_attachments(&record.attachments, &record.embeds);
        if !extra.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&extra);
            text = text.trim().to_owned();
        }

        Some(Row {
            timestamp: to_epoch_seconds(&record.timestamp),
            channel,
            username,
            text,
        })
    }

    /// Picks the unsanitized channel name for a message.
    fn resolve_channel(&self, source: &Path, record: &MessageRecord) -> String {
        if let Some(forced) = &self.forced_channel {
            return forced.clone();
        }
        if let Some(mapped) = record
            .channel_id
            .as_deref()
            .and_then(|id| self.channel_map.get(id))
        {
            return mapped.to_owned();
        }
        channel_from_filename(source)
    }
}

/// Derives a channel name from an export file name.
///
/// `general_page3.json` and `General.JSON` both become `general`.
#[must_use]
pub fn channel_from_filename(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let base: &str = &name;
    let stem = strip_suffix_ignore_case(base, ".json").unwrap_or(base);
    let stem = stem.split("_page").next().unwrap_or(stem);
    sanitize_channel(stem)
}

/// Strips an ASCII suffix, ignoring case.
fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then_some(&s[..split])
}

/// Lists attachment and embed links, one per line.
///
/// Attachments prefer their URL, then proxy URL, then file name. Embeds
/// contribute their URL. Returns an empty string when there is nothing to
/// show.
#[must_use]
pub fn render_attachments(attachments: &[Attachment], embeds: &[String]) -> String {
    attachments
        .iter()
        .filter_map(Attachment::link)
        .chain(embeds.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Parses one export file's JSON text and builds its rows.
///
/// # Errors
///
/// Returns an error if `json_str` is not valid JSON.
pub fn rows_from_json(
    source: &Path,
    json_str: &str,
    builder: &RowBuilder,
) -> Result<Vec<Row>, ParseError> {
    let records = parser::parse_messages(json_str)?;
    let rows = builder.build_rows(source, &records);
    tracing::debug!(
        source = %source.display(),
        messages = records.len(),
        rows = rows.len(),
        "built rows"
    );
    Ok(rows)
}

/// Sorts rows oldest first. Rows with equal timestamps keep their order.
pub fn sort_rows(rows: &mut [Row]) {
    rows.sort_by_key(|row| row.timestamp);
}
