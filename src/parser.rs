// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON parsing for Discord chat exports.
//!
//! Discord exports come from many different tools, and they disagree on
//! where the message list lives. This module locates the messages inside an
//! arbitrarily shaped document and reads each one into a [`MessageRecord`],
//! a partial record whose fields are all optional.
//!
//! # Recognized Shapes
//!
//! - A bare array of messages
//! - An object holding the array under `data`, `messages`, `results`, or
//!   `records`
//! - Nested objects keyed by channel and message id
//!
//! Anything else yields no messages rather than an error.
//!
//! # Example
//!
//! ```
//! use dc2slack::parser::parse_messages;
//!
//! let json = r#"{
//!     "messages": [
//!         { "type": 0, "content": "Hello", "author": { "username": "bo" } }
//!     ]
//! }"#;
//!
//! let messages = parse_messages(json).unwrap();
//! assert_eq!(messages.len(), 1);
//! assert_eq!(messages[0].username(), Some("bo"));
//! ```

use crate::timestamp::RawTimestamp;
use serde_json::{Map, Value};
use snafu::prelude::*;

/// Keys that commonly hold the message array in wrapped exports.
const LIST_KEYS: &[&str] = &["data", "messages", "results", "records"];

/// Error type for JSON parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// Failed to parse JSON content.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },
}

/// Whether a message is an ordinary chat message.
///
/// Discord tags join notices, pins, boosts and the like with a non-zero
/// `type`. Only type `0` (or no type at all) is imported; `false` counts as
/// `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    /// A regular chat message.
    #[default]
    Chat,
    /// A system or otherwise non-chat message.
    Other,
}

impl From<Option<&Value>> for MessageKind {
    fn from(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Bool(false)) => Self::Chat,
            Some(v) if v.as_f64() == Some(0.0) => Self::Chat,
            Some(_) => Self::Other,
        }
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// A structured attachment entry.
    File {
        /// Direct CDN URL.
        url: Option<String>,
        /// Media proxy URL.
        proxy_url: Option<String>,
        /// Original file name.
        filename: Option<String>,
    },
    /// A bare entry, already rendered as text.
    Raw(String),
}

impl Attachment {
    /// Returns the best printable reference: URL, then proxy URL, then name.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        match self {
            Self::File {
                url,
                proxy_url,
                filename,
            } => url
                .as_deref()
                .or(proxy_url.as_deref())
                .or(filename.as_deref()),
            Self::Raw(text) => Some(text),
        }
    }
}

/// A single message read from an export.
///
/// Every field is optional because no export tool is guaranteed to write
/// any of them. Use the accessor methods for the defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageRecord {
    /// Chat or non-chat, from the `type` field.
    pub kind: MessageKind,
    /// The raw `timestamp` value.
    pub timestamp: RawTimestamp,
    /// The raw message body.
    pub content: Option<String>,
    /// Display name from a flat `userName` field.
    pub user_name: Option<String>,
    /// Name from a nested `author.username` field.
    pub author_username: Option<String>,
    /// The source channel identifier.
    pub channel_id: Option<String>,
    /// Attached files.
    pub attachments: Vec<Attachment>,
    /// URLs of link embeds.
    pub embeds: Vec<String>,
}

impl MessageRecord {
    /// Reads a message from a JSON object, ignoring fields of the wrong type.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            kind: MessageKind::from(map.get("type")),
            timestamp: RawTimestamp::from(map.get("timestamp")),
            content: map.get("content").and_then(scalar_text),
            user_name: map.get("userName").and_then(scalar_text),
            author_username: map
                .get("author")
                .and_then(|a| a.get("username"))
                .and_then(scalar_text),
            channel_id: map
                .get("channel_id")
                .and_then(scalar_text)
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty()),
            attachments: extract_attachments(map.get("attachments")),
            embeds: extract_embeds(map.get("embeds")),
        }
    }

    /// Returns `true` if this is a regular chat message.
    #[must_use]
    pub fn is_chat(&self) -> bool {
        self.kind == MessageKind::Chat
    }

    /// The message body, or an empty string.
    #[must_use]
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// The first non-empty of `userName` and `author.username`.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        non_empty(self.user_name.as_deref()).or_else(|| non_empty(self.author_username.as_deref()))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Reads a string or number as text. Other JSON types yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`scalar_text`] but treats empty strings as absent.
fn field_text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_text).filter(|s| !s.is_empty())
}

/// Reads the `attachments` array. Non-object entries are kept as raw text.
fn extract_attachments(value: Option<&Value>) -> Vec<Attachment> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|entry| match entry {
            Value::Object(_) => Attachment::File {
                url: field_text(entry, "url"),
                proxy_url: field_text(entry, "proxy_url"),
                filename: field_text(entry, "filename"),
            },
            Value::String(s) => Attachment::Raw(s.clone()),
            other => Attachment::Raw(other.to_string()),
        })
        .collect()
}

/// Reads the URLs of the `embeds` array. Embeds without a URL are skipped.
fn extract_embeds(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|embed| embed.is_object())
        .filter_map(|embed| field_text(embed, "url"))
        .collect()
}

fn objects(values: &[Value]) -> Vec<&Map<String, Value>> {
    values.iter().filter_map(Value::as_object).collect()
}

/// Locates the message objects inside an export document.
///
/// The detection order is:
///
/// 1. A top-level array: its object entries.
/// 2. An object with an array under `data`, `messages`, `results`, or
///    `records`: that array's object entries.
/// 3. An object of objects (channel → message id → message): if the first
///    value's own first value is an object, the first value's values;
///    otherwise the top-level values.
/// 4. Anything else: nothing.
///
/// "First" follows document order.
#[must_use]
pub fn extract_messages(doc: &Value) -> Vec<&Map<String, Value>> {
    match doc {
        Value::Array(items) => objects(items),
        Value::Object(map) => {
            if let Some(items) = LIST_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
            {
                return objects(items);
            }

            let Some(first) = map.values().next().and_then(Value::as_object) else {
                return Vec::new();
            };

            if first.values().next().is_some_and(Value::is_object) {
                first.values().filter_map(Value::as_object).collect()
            } else {
                map.values().filter_map(Value::as_object).collect()
            }
        }
        _ => Vec::new(),
    }
}

/// Parses a JSON export into its message records.
///
/// This is the main entry point for reading an export file.
///
/// # Errors
///
/// Returns an error only if the text is not valid JSON. A valid document in
/// an unrecognized shape yields an empty list.
///
/// # Example
///
/// ```
/// use dc2slack::parser::parse_messages;
///
/// let messages = parse_messages(r#"{"unexpected": true}"#).unwrap();
/// assert!(messages.is_empty());
/// ```
pub fn parse_messages(json_str: &str) -> Result<Vec<MessageRecord>, ParseError> {
    let doc: Value = serde_json::from_str(json_str).context(JsonSnafu)?;
    Ok(extract_messages(&doc)
        .into_iter()
        .map(MessageRecord::from_map)
        .collect())
}
