// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for dc2slack.
//!
//! This binary provides the `dc2slack` command for converting Discord chat
//! exports to a Slack import CSV, and for preflighting existing CSVs.

use dc2slack::{channel_map, inputs, parser, preflight, renderer, rows, sanitize};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Output file used when `--outfile` is not given.
const DEFAULT_OUTFILE: &str = "discord-to-slack.csv";

/// What the invocation should do.
enum Mode {
    /// Convert JSON exports to CSV, then preflight the result.
    Convert {
        channel: Option<String>,
        channel_map: Option<PathBuf>,
        outfile: PathBuf,
    },
    /// Only preflight an existing CSV.
    PreflightOnly,
}

struct Cli {
    inputs: Vec<PathBuf>,
    mode: Mode,
    verbose: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file, pattern, or directory is required"))]
    NoInputs,

    #[snafu(display("no JSON files found from inputs/patterns (example: *.json or data/**/*.json)"))]
    NoJsonFiles,

    #[snafu(display(
        "in --preflight-only mode, pass exactly one CSV file (patterns/dirs allowed)"
    ))]
    PreflightUsage,

    #[snafu(display("{source}"))]
    ChannelMap {
        source: channel_map::ChannelMapError,
    },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteCsv {
        path: PathBuf,
        source: renderer::WriteError,
    },

    #[snafu(display("failed to preflight {}: {source}", path.display()))]
    Preflight {
        path: PathBuf,
        source: preflight::PreflightError,
    },
}

impl Error {
    /// Usage problems exit with 2, everything else with 1.
    const fn exit_code(&self) -> u8 {
        match self {
            Self::ParseArgs { .. } | Self::NoInputs | Self::NoJsonFiles | Self::PreflightUsage => 2,
            _ => 1,
        }
    }
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert Discord JSON exports to a Slack-importable CSV, with preflight checks

Usage: {name} [OPTIONS] <INPUT>...
       {name} --preflight-only <CSV>

Arguments:
  <INPUT>...  Discord JSON files, glob patterns, or directories

Options:
  -o, --outfile <PATH>        Output CSV path (default: {outfile})
      --channel <NAME>        Put every message in this Slack channel
      --channel-map <PATH>    JSON object or 2-column CSV: channel_id -> channel name
      --preflight-only        Only validate the given CSV (no conversion)
  -v, --verbose               Log per-file details to stderr
  -h, --help                  Print help
  -V, --version               Print version

Set RUST_LOG to control log filtering (default: warn).",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        outfile = DEFAULT_OUTFILE,
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut inputs = Vec::new();
    let mut channel = None;
    let mut channel_map = None;
    let mut outfile = PathBuf::from(DEFAULT_OUTFILE);
    let mut preflight_only = false;
    let mut verbose = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("outfile") => outfile = parser.value()?.parse()?,
            Long("channel") => channel = Some(parser.value()?.string()?),
            Long("channel-map") => channel_map = Some(parser.value()?.parse()?),
            Long("preflight-only") => preflight_only = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => inputs.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    let mode = if preflight_only {
        Mode::PreflightOnly
    } else {
        Mode::Convert {
            channel,
            channel_map,
            outfile,
        }
    };

    Ok(Cli {
        inputs,
        mode,
        verbose,
    })
}

/// Sends logs to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Warning: could not initialize logging: {e}");
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(cli.verbose);

    ensure!(!cli.inputs.is_empty(), NoInputsSnafu);

    match &cli.mode {
        Mode::PreflightOnly => run_preflight_only(&cli.inputs),
        Mode::Convert {
            channel,
            channel_map,
            outfile,
        } => run_convert(
            &cli.inputs,
            channel.as_deref(),
            channel_map.as_deref(),
            outfile,
        ),
    }
}

/// Validates a single existing CSV and prints the report.
fn run_preflight_only(patterns: &[PathBuf]) -> Result<(), Error> {
    let files = inputs::expand_inputs(patterns);
    let [csv] = files.as_slice() else {
        return PreflightUsageSnafu.fail();
    };
    ensure!(inputs::has_extension(csv, "csv"), PreflightUsageSnafu);

    let report = preflight::preflight_path(csv).context(PreflightSnafu { path: csv })?;
    print!("{}", report.summary(&file_label(csv)));
    Ok(())
}

/// Converts all JSON inputs into one sorted CSV, then preflights it.
fn run_convert(
    patterns: &[PathBuf],
    channel: Option<&str>,
    map_path: Option<&Path>,
    outfile: &Path,
) -> Result<(), Error> {
    let map = map_path
        .map(channel_map::load_channel_map)
        .transpose()
        .context(ChannelMapSnafu)?
        .unwrap_or_default();

    let files: Vec<PathBuf> = inputs::expand_inputs(patterns)
        .into_iter()
        .filter(|path| inputs::has_extension(path, "json"))
        .collect();
    ensure!(!files.is_empty(), NoJsonFilesSnafu);
    tracing::debug!(files = files.len(), "resolved input files");

    let mut builder = rows::RowBuilder::new().with_channel_map(map);
    if let Some(channel) = channel.filter(|c| !c.is_empty()) {
        builder = builder.with_forced_channel(sanitize::sanitize_channel(channel));
    }

    let mut all_rows = Vec::new();
    for path in &files {
        let json = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        let file_rows =
            rows::rows_from_json(path, &json, &builder).context(ParseFileSnafu { path })?;
        all_rows.extend(file_rows);
    }
    rows::sort_rows(&mut all_rows);

    renderer::write_rows_to_path(outfile, &all_rows).context(WriteCsvSnafu { path: outfile })?;

    let report = preflight::preflight_path(outfile).context(PreflightSnafu { path: outfile })?;
    print!("{}", report.summary(&file_label(outfile)));

    if report.is_clean() {
        println!(
            "\nWrote {} rows to {} (looks Slack-ready).",
            all_rows.len(),
            outfile.display()
        );
    } else {
        println!(
            "\nWrote {} rows to {}, but preflight found issues above.",
            all_rows.len(),
            outfile.display()
        );
    }
    Ok(())
}

/// The file name of `path`, for report headings.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
