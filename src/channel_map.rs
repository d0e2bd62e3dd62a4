// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Loading the channel id → channel name map.
//!
//! The map can be a JSON object (`{"1234": "general"}`) or a two-column
//! delimited file (`1234,general`). The format is picked by file extension.

use serde_json::Value;
use snafu::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Error type for channel map loading failures.
#[derive(Debug, Snafu)]
pub enum ChannelMapError {
    /// The map file could not be read.
    #[snafu(display("failed to read channel map {}: {source}", path.display()))]
    Read {
        /// Path of the map file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The JSON map file is not valid JSON.
    #[snafu(display("failed to parse channel map {}: {source}", path.display()))]
    Json {
        /// Path of the map file.
        path: PathBuf,
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },

    /// The JSON map file is valid JSON but not an object.
    #[snafu(display("channel map {} must be a JSON object", path.display()))]
    NotAnObject {
        /// Path of the map file.
        path: PathBuf,
    },

    /// The delimited map file is malformed.
    #[snafu(display("failed to parse channel map {}: {source}", path.display()))]
    Csv {
        /// Path of the map file.
        path: PathBuf,
        /// The underlying CSV error.
        source: csv::Error,
    },
}

/// Maps source channel ids to destination channel names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMap {
    entries: HashMap<String, String>,
}

impl ChannelMap {
    /// Returns the destination name for a source channel id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Number of mapped ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for ChannelMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Loads a channel map from `path`.
///
/// Paths ending in `.json` (any case) are read as a JSON object whose keys
/// are channel ids. String and numeric values are used; other values are
/// skipped with a warning. Any other path is read as a delimited file where
/// the first column is the id and the second the name; extra columns are
/// ignored and shorter rows are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_channel_map(path: &Path) -> Result<ChannelMap, ChannelMapError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let map = if is_json {
        let text = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        parse_json_map(&text, path)?
    } else {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .context(CsvSnafu { path })?;
        parse_delimited_map(reader, path)?
    };

    tracing::debug!(path = %path.display(), entries = map.len(), "loaded channel map");
    Ok(map)
}

fn parse_json_map(text: &str, path: &Path) -> Result<ChannelMap, ChannelMapError> {
    let doc: Value = serde_json::from_str(text).context(JsonSnafu { path })?;
    let Value::Object(object) = doc else {
        return NotAnObjectSnafu { path }.fail();
    };

    Ok(object
        .into_iter()
        .filter_map(|(id, name)| match name {
            Value::String(s) => Some((id, s)),
            Value::Number(n) => Some((id, n.to_string())),
            other => {
                tracing::warn!(%id, value = %other, "ignoring non-text channel map value");
                None
            }
        })
        .collect())
}

fn parse_delimited_map<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<ChannelMap, ChannelMapError> {
    let mut entries = HashMap::new();
    for record in reader.records() {
        let record = record.context(CsvSnafu { path })?;
        if let (Some(id), Some(name)) = (record.get(0), record.get(1)) {
            entries.insert(id.trim().to_owned(), name.trim().to_owned());
        }
    }
    Ok(ChannelMap { entries })
}
