// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! CSV rendering for Slack import rows.
//!
//! Slack's importer expects four columns, `timestamp, channel, username,
//! text`, with no header row. Every field is quoted, and newlines inside the
//! message text are written literally inside the quotes.
//!
//! # Example
//!
//! ```
//! use dc2slack::renderer::write_rows;
//! use dc2slack::rows::Row;
//!
//! let rows = vec![Row {
//!     timestamp: 1609459200,
//!     channel: "general".into(),
//!     username: "bo".into(),
//!     text: "two\nlines".into(),
//! }];
//!
//! let mut out = Vec::new();
//! write_rows(&mut out, &rows).unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "\"1609459200\",\"general\",\"bo\",\"two\nlines\"\r\n"
//! );
//! ```

use crate::rows::Row;
use snafu::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Error type for CSV output failures.
#[derive(Debug, Snafu)]
pub enum WriteError {
    /// The output file could not be created.
    #[snafu(display("failed to create {}: {source}", path.display()))]
    Create {
        /// Path of the output file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A row could not be serialized or written.
    #[snafu(display("failed to write CSV row: {source}"))]
    Row {
        /// The underlying CSV error.
        source: csv::Error,
    },

    /// Buffered output could not be flushed.
    #[snafu(display("failed to flush CSV output: {source}"))]
    Flush {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Writes `rows` as import CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_rows<W: Write>(out: W, rows: &[Row]) -> Result<(), WriteError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);

    for row in rows {
        writer.serialize(row).context(RowSnafu)?;
    }
    writer.flush().context(FlushSnafu)
}

/// Writes `rows` as import CSV to the file at `path`, replacing it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_rows_to_path(path: &Path, rows: &[Row]) -> Result<(), WriteError> {
    let file = std::fs::File::create(path).context(CreateSnafu { path })?;
    write_rows(std::io::BufWriter::new(file), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(timestamp: u64, text: &str) -> Row {
        Row {
            timestamp,
            channel: "general".into(),
            username: "bo".into(),
            text: text.into(),
        }
    }

    fn render(rows: &[Row]) -> String {
        let mut out = Vec::new();
        write_rows(&mut out, rows).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn quotes_every_field() {
        assert_eq!(
            render(&[row(5, "hi")]),
            "\"5\",\"general\",\"bo\",\"hi\"\r\n"
        );
    }

    #[test]
    fn writes_no_header() {
        let output = render(&[row(1, "a"), row(2, "b")]);
        assert_eq!(output.lines().count(), 2);
        assert!(!output.contains("timestamp"));
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert!(render(&[row(1, r#"say "hi""#)]).contains(r#""say ""hi""""#));
    }

    #[test]
    fn keeps_newlines_inside_text() {
        assert!(render(&[row(1, "a\nb")]).ends_with("\"a\nb\"\r\n"));
    }

    #[test]
    fn round_trips_through_csv_reader() {
        let rows = [row(1, "multi\nline, with \"quotes\""), row(2, "")];
        let output = render(&rows);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(output.as_bytes());
        let texts: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[3].to_owned())
            .collect();
        assert_eq!(texts, ["multi\nline, with \"quotes\"", ""]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        assert_eq!(render(&[]), "");
    }
}
