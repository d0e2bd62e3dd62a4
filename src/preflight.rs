// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Preflight validation of Slack import CSVs.
//!
//! Preflight re-reads a CSV the way Slack's importer will and counts the
//! problems it finds instead of stopping at the first one: rows without
//! exactly four columns, non-numeric timestamps, timestamps that go
//! backwards, and channel or username columns that are not valid slugs.
//!
//! The file is never assumed to have a header row, so a header counts as a
//! bad row. Blank lines are rows with no columns, so each one is counted as
//! a row with the wrong number of columns.
//!
//! # Example
//!
//! ```
//! use dc2slack::preflight::preflight_reader;
//!
//! let csv = "\"1\",\"general\",\"bo\",\"hi\"\n\"2\",\"general\",\"bo\",\"bye\"\n";
//! let report = preflight_reader(csv.as_bytes()).unwrap();
//!
//! assert_eq!(report.rows, 2);
//! assert!(report.is_clean());
//! ```

use crate::sanitize::{CHANNEL_RE, USERNAME_RE};
use snafu::prelude::*;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Error type for preflight failures.
///
/// Only unreadable input is an error; malformed rows are counted in the
/// [`PreflightReport`].
#[derive(Debug, Snafu)]
pub enum PreflightError {
    /// The CSV file could not be opened.
    #[snafu(display("failed to open {}: {source}", path.display()))]
    Open {
        /// Path of the CSV file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The input stream could not be read.
    #[snafu(display("failed to read input: {source}"))]
    Input {
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The CSV data could not be parsed (for example, invalid UTF-8).
    #[snafu(display("failed to read CSV: {source}"))]
    Read {
        /// The underlying CSV error.
        source: csv::Error,
    },
}

/// Problem counts from a preflight pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreflightReport {
    /// Total rows read.
    pub rows: u64,
    /// Rows without exactly four columns.
    pub wrong_cols: u64,
    /// Rows whose timestamp is not all digits.
    pub bad_ts: u64,
    /// Rows whose channel is not a valid slug.
    pub bad_channel: u64,
    /// Rows whose username is not a valid slug.
    pub bad_username: u64,
    /// Rows with a timestamp lower than the previous row's.
    pub unsorted: u64,
}

impl PreflightReport {
    /// Returns `true` if no problems were found.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.wrong_cols == 0
            && self.bad_ts == 0
            && self.unsorted == 0
            && self.bad_channel == 0
            && self.bad_username == 0
    }

    /// The counters by name, in report order.
    #[must_use]
    pub const fn counters(&self) -> [(&'static str, u64); 6] {
        [
            ("rows", self.rows),
            ("wrong_cols", self.wrong_cols),
            ("bad_ts", self.bad_ts),
            ("unsorted", self.unsorted),
            ("bad_channel", self.bad_channel),
            ("bad_username", self.bad_username),
        ]
    }

    /// Renders the report under a `[Preflight] <label>` heading.
    #[must_use]
    pub fn summary(&self, label: &str) -> String {
        let mut out = format!("[Preflight] {label}\n");
        for (name, count) in self.counters() {
            writeln!(out, "  {name}: {count}").unwrap();
        }
        out
    }
}

/// Tracks timestamp order across rows.
///
/// Compares each timestamp with the previous numeric one only, so a single
/// out-of-order row is counted once rather than flagging every row after it.
#[derive(Debug, Default)]
struct OrderCheck {
    last: Option<u128>,
}

impl OrderCheck {
    /// Records `ts` and returns `true` if it is lower than the previous one.
    fn is_out_of_order(&mut self, ts: u128) -> bool {
        let unsorted = self.last.is_some_and(|last| ts < last);
        self.last = Some(ts);
        unsorted
    }
}

/// Returns `true` if `s` is a non-empty run of ASCII digits.
fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Counts blank lines outside quoted fields.
///
/// The `csv` reader skips these silently, but an importer sees each one as
/// an empty row. `\r\n` counts as a single line ending.
fn count_blank_lines(data: &[u8]) -> u64 {
    let mut blank = 0;
    let mut in_quotes = false;
    let mut line_start = true;
    let mut field_start = true;
    let mut bytes = data.iter().copied().peekable();

    while let Some(b) = bytes.next() {
        if in_quotes {
            if b == b'"' {
                if bytes.peek() == Some(&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match b {
            b'"' if field_start => {
                in_quotes = true;
                line_start = false;
                field_start = false;
            }
            b'\r' | b'\n' => {
                if line_start {
                    blank += 1;
                }
                if b == b'\r' && bytes.peek() == Some(&b'\n') {
                    bytes.next();
                }
                line_start = true;
                field_start = true;
            }
            b',' => {
                line_start = false;
                field_start = true;
            }
            _ => {
                line_start = false;
                field_start = false;
            }
        }
    }

    blank
}

/// Runs preflight over CSV data from any reader.
///
/// # Errors
///
/// Returns an error if the data cannot be read or is not valid UTF-8.
pub fn preflight_reader<R: Read>(mut input: R) -> Result<PreflightReport, PreflightError> {
    let mut data = Vec::new();
    input.read_to_end(&mut data).context(InputSnafu)?;
    check_records(&data)
}

/// Runs preflight over the CSV file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn preflight_path(path: &Path) -> Result<PreflightReport, PreflightError> {
    let data = fs::read(path).context(OpenSnafu { path })?;
    let report = check_records(&data)?;
    tracing::debug!(path = %path.display(), ?report, "preflight finished");
    Ok(report)
}

fn check_records(data: &[u8]) -> Result<PreflightReport, PreflightError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let blank = count_blank_lines(data);
    let mut report = PreflightReport {
        rows: blank,
        wrong_cols: blank,
        ..PreflightReport::default()
    };
    let mut order = OrderCheck::default();

    for record in reader.records() {
        let record = record.context(ReadSnafu)?;
        report.rows += 1;

        if record.len() != 4 {
            report.wrong_cols += 1;
            continue;
        }
        let (ts, channel, username) = (&record[0], &record[1], &record[2]);

        if is_all_digits(ts) {
            // Digit runs too long for u128 are still ordered last.
            let value = ts.parse().unwrap_or(u128::MAX);
            if order.is_out_of_order(value) {
                report.unsorted += 1;
            }
        } else {
            report.bad_ts += 1;
        }

        if !CHANNEL_RE.is_match(channel) {
            report.bad_channel += 1;
        }
        if !USERNAME_RE.is_match(username) {
            report.bad_username += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(csv: &str) -> PreflightReport {
        preflight_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn clean_file_reports_only_rows() {
        let report = check(
            "\"1\",\"general\",\"bo\",\"a\"\r\n\
             \"2\",\"dev-talk\",\"j.doe\",\"b\nc\"\r\n\
             \"3\",\"general\",\"bo\",\"\"\r\n",
        );
        assert_eq!(
            report,
            PreflightReport {
                rows: 3,
                ..PreflightReport::default()
            }
        );
        assert!(report.is_clean());
    }

    #[test]
    fn empty_file_is_clean() {
        assert_eq!(check(""), PreflightReport::default());
    }

    #[test]
    fn counts_wrong_column_rows_and_skips_their_checks() {
        let report = check("1,general,bo\n1,general,bo,hi,extra\nnot,a,valid,ROW!\n");
        assert_eq!(report.rows, 3);
        assert_eq!(report.wrong_cols, 2);
        assert_eq!(report.bad_ts, 1);
        assert_eq!(report.bad_channel, 0);
        assert_eq!(report.bad_username, 0);
    }

    #[test]
    fn blank_line_counts_as_wrong_cols() {
        let report = check("\"1\",\"c\",\"u\",\"a\"\r\n\r\n\"2\",\"c\",\"u\",\"b\"\r\n");
        assert_eq!(report.rows, 3);
        assert_eq!(report.wrong_cols, 1);
        assert_eq!(report.unsorted, 0);
    }

    #[test]
    fn blank_lines_inside_quotes_are_text() {
        let report = check("\"1\",\"c\",\"u\",\"a\n\n\"\"b\"\"\r\n\r\n\"\n\"2\",\"c\",\"u\",\"b\"\n");
        assert_eq!(report.rows, 2);
        assert_eq!(report.wrong_cols, 0);
    }

    #[test]
    fn counts_trailing_and_lf_blank_lines() {
        assert_eq!(check("1,c,u,a\n\n\n").rows, 3);
        assert_eq!(check("\n").wrong_cols, 1);
        assert_eq!(check("1,c,u,a\r\r\n2,c,u,b\r\n").wrong_cols, 1);
    }

    #[test]
    fn counts_header_as_bad_row() {
        let report = check("timestamp,channel,username,text\n1,general,bo,hi\n");
        assert_eq!(report.rows, 2);
        assert_eq!(report.bad_ts, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn flags_bad_timestamps() {
        let report = check("-1,general,bo,a\n1.5,general,bo,a\n,general,bo,a\n 2,general,bo,a\n");
        assert_eq!(report.bad_ts, 4);
        assert_eq!(report.unsorted, 0);
    }

    #[test]
    fn flags_bad_slugs() {
        let report = check("1,General,bo,a\n2,general,bo b,a\n3,,,a\n");
        assert_eq!(report.bad_channel, 2);
        assert_eq!(report.bad_username, 2);
    }

    #[test]
    fn single_out_of_order_row_counts_once() {
        let report = check("10,c,u,a\n20,c,u,a\n5,c,u,a\n30,c,u,a\n40,c,u,a\n");
        assert_eq!(report.unsorted, 1);
    }

    #[test]
    fn order_tracks_last_value_not_maximum() {
        // 5 < 20 counts; 10 > 5 does not, even though 10 < 20.
        let report = check("20,c,u,a\n5,c,u,a\n10,c,u,a\n");
        assert_eq!(report.unsorted, 1);
    }

    #[test]
    fn non_numeric_rows_do_not_reset_order() {
        let report = check("20,c,u,a\nx,c,u,a\n10,c,u,a\n");
        assert_eq!(report.bad_ts, 1);
        assert_eq!(report.unsorted, 1);
    }

    #[test]
    fn equal_timestamps_are_sorted() {
        assert_eq!(check("7,c,u,a\n7,c,u,b\n").unsorted, 0);
    }

    #[test]
    fn non_ascii_digits_are_bad_timestamps() {
        let report = check("\u{661}\u{662}\u{663},c,u,a\n\u{ff11},c,u,a\n");
        assert_eq!(report.bad_ts, 2);
    }

    #[test]
    fn huge_timestamps_are_numeric() {
        let huge = "9".repeat(50);
        let report = check(&format!("{huge},c,u,a\n1,c,u,a\n"));
        assert_eq!(report.bad_ts, 0);
        assert_eq!(report.unsorted, 1);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let result = preflight_reader(&b"1,c,u,\xff\xfe\n"[..]);
        assert!(matches!(result, Err(PreflightError::Read { .. })));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = preflight_path(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(PreflightError::Open { .. })));
    }

    #[test]
    fn summary_lists_counters_in_order() {
        let report = PreflightReport {
            rows: 4,
            unsorted: 1,
            ..PreflightReport::default()
        };
        assert_eq!(
            report.summary("out.csv"),
            "[Preflight] out.csv\n  rows: 4\n  wrong_cols: 0\n  bad_ts: 0\n  unsorted: 1\n  bad_channel: 0\n  bad_username: 0\n"
        );
    }
}
