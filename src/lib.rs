// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert Discord chat exports to a Slack-importable CSV.
//!
//! This crate reads Discord message exports in the many JSON shapes that
//! export tools produce, sanitizes them for Slack's CSV importer, and
//! validates the resulting CSV before import.
//!
//! # Overview
//!
//! 1. [`parser`] finds the messages inside each export document
//! 2. [`rows`] turns each chat message into a row, using [`sanitize`] and
//!    [`timestamp`] to clean every column
//! 3. [`renderer`] writes the rows as a four-column quoted CSV
//! 4. [`preflight`] re-reads a CSV and counts anything Slack would reject
//!
//! # Example
//!
//! ```no_run
//! use dc2slack::{preflight, renderer, rows};
//! use std::path::Path;
//!
//! let path = Path::new("general.json");
//! let json = std::fs::read_to_string(path).unwrap();
//!
//! let builder = rows::RowBuilder::new();
//! let mut all = rows::rows_from_json(path, &json, &builder).unwrap();
//! rows::sort_rows(&mut all);
//!
//! let out = Path::new("slack-import.csv");
//! renderer::write_rows_to_path(out, &all).unwrap();
//!
//! let report = preflight::preflight_path(out).unwrap();
//! print!("{}", report.summary("slack-import.csv"));
//! ```
//!
//! # Modules
//!
//! - [`timestamp`]: Epoch-second normalization for mixed timestamp formats
//! - [`parser`]: Message extraction and the partial message record type
//! - [`sanitize`]: Message text, channel, and username sanitizers
//! - [`rows`]: Row building, channel resolution, and attachment links
//! - [`renderer`]: CSV output
//! - [`preflight`]: CSV validation
//! - [`channel_map`]: Channel id → name map loading
//! - [`inputs`]: Directory and glob expansion for input paths

#![deny(missing_docs)]

pub mod channel_map;
pub mod inputs;
pub mod parser;
pub mod preflight;
pub mod renderer;
pub mod rows;
pub mod sanitize;
pub mod timestamp;
