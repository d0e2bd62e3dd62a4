// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Resolving command-line inputs to files.
//!
//! Each input can be a directory (searched recursively for `.json` files), a
//! glob pattern such as `exports/**/*.json`, or a plain path. Globs are
//! expanded here rather than by the shell so that quoted patterns and
//! Windows shells work the same way.

use globset::{GlobBuilder, GlobMatcher};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Characters that make a path component a glob pattern.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expands every input into a list of files.
///
/// Directories contribute all `.json` files below them. Glob patterns
/// contribute matching files in sorted order. Plain paths are kept if they
/// exist. Inputs that resolve to nothing are logged as warnings and
/// otherwise ignored.
#[must_use]
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let found = expand_input(input);
        if found.is_empty() {
            tracing::warn!(input = %input.display(), "pattern matched no files");
        }
        files.extend(found);
    }
    files
}

fn expand_input(input: &Path) -> Vec<PathBuf> {
    if input.is_dir() {
        return json_files_under(input);
    }
    if is_glob(input) {
        return expand_glob(input);
    }
    if input.exists() {
        return vec![input.to_path_buf()];
    }
    Vec::new()
}

/// Returns `true` if `path` has an extension equal to `ext`, ignoring case.
#[must_use]
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Collects all JSON files below a directory.
fn json_files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

fn is_glob(path: &Path) -> bool {
    path.to_string_lossy().contains(GLOB_META)
}

/// Splits a pattern into the literal directory to search from and the
/// number of components below it, or `None` for the depth when the pattern
/// can match at any depth.
fn glob_root(pattern: &Path) -> (PathBuf, Option<usize>) {
    let mut root = PathBuf::new();
    let mut components = pattern.components().peekable();

    while let Some(component) = components.peek() {
        if let Component::Normal(part) = component
            && part.to_string_lossy().contains(GLOB_META)
        {
            break;
        }
        root.push(component);
        components.next();
    }

    let rest: Vec<Component<'_>> = components.collect();
    let unbounded = rest.iter().any(|c| c.as_os_str() == "**");
    (root, (!unbounded).then_some(rest.len()))
}

fn compile(pattern: &str) -> Option<GlobMatcher> {
    match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            tracing::warn!(%pattern, error = %e, "invalid glob pattern");
            None
        }
    }
}

/// Expands a glob pattern by walking from its literal prefix.
fn expand_glob(pattern: &Path) -> Vec<PathBuf> {
    let pattern_str = pattern.to_string_lossy();
    let Some(matcher) = compile(&pattern_str) else {
        return Vec::new();
    };

    let (root, depth) = glob_root(pattern);
    let relative = root.as_os_str().is_empty();
    let walk_root = if relative { Path::new(".") } else { root.as_path() };

    let mut walker = WalkDir::new(walk_root).min_depth(1);
    if let Some(depth) = depth {
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let path = e.into_path();
            if relative {
                path.strip_prefix(".").map(Path::to_path_buf).unwrap_or(path)
            } else {
                path
            }
        })
        .filter(|path| matcher.is_match(path))
        .collect();
    files.sort();
    files
}
