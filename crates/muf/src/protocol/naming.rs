// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical key paths and notification channel decoding.
//!
//! Every key the fabric reads or writes has the shape
//! `muf/<unit>/<status>/<id>`. The store itself is case-sensitive, so all
//! four segments are forced to lowercase at every boundary — building,
//! parsing, and channel decoding — which keeps unit names case-insensitive
//! for callers.

use crate::error::MufError;
use crate::protocol::{Status, KEYSPACE_PREFIX, PATH_SEPARATOR, PROTOCOL_ROOT};

/// A key path decomposed into its addressing segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub unit: String,
    pub status: Status,
    pub id: String,
}

/// Build the canonical path `muf/<unit>/<status>/<id>`.
///
/// Unit and id are lowercased. Empty segments and segments containing the
/// separator are rejected; wildcard characters pass through untouched so
/// the result can double as a dispatch pattern.
pub fn build_path(unit: &str, status: Status, id: &str) -> Result<String, MufError> {
    let unit = unit.to_lowercase();
    let id = id.to_lowercase();
    for segment in [unit.as_str(), id.as_str()] {
        if segment.is_empty() {
            return Err(MufError::InvalidPath("empty path segment".to_owned()));
        }
        if segment.contains(PATH_SEPARATOR) {
            return Err(MufError::InvalidPath(format!(
                "segment {segment:?} contains the path separator"
            )));
        }
    }
    Ok(format!("{PROTOCOL_ROOT}{PATH_SEPARATOR}{unit}{PATH_SEPARATOR}{status}{PATH_SEPARATOR}{id}"))
}

/// Parse a key path back into `(unit, status, id)`.
///
/// The input is lowercased before splitting. Returns `None` unless there
/// are exactly four non-empty segments, the first equals the protocol
/// root, and the third is a known status token.
pub fn parse_path(path: &str) -> Option<ParsedPath> {
    let normalized = path.to_lowercase();
    let parts: Vec<&str> = normalized.split(PATH_SEPARATOR).collect();
    if parts.len() != 4 || parts[0] != PROTOCOL_ROOT {
        return None;
    }
    if parts[1].is_empty() || parts[3].is_empty() {
        return None;
    }
    let status = parts[2].parse::<Status>().ok()?;
    Some(ParsedPath { unit: parts[1].to_owned(), status, id: parts[3].to_owned() })
}

/// Build the channel pattern for a keyspace subscription covering the
/// given path shape. `*` in every position yields the single broad
/// pattern the watcher subscribes once, for all units.
pub fn build_keyspace_pattern(unit: &str, status: &str, id: &str) -> String {
    format!(
        "{KEYSPACE_PREFIX}{PROTOCOL_ROOT}{PATH_SEPARATOR}{}{PATH_SEPARATOR}{}{PATH_SEPARATOR}{}",
        unit.to_lowercase(),
        status.to_lowercase(),
        id.to_lowercase(),
    )
}

/// Extract the key path from a notification channel name.
///
/// Channels arrive as `<prefix>:<key>`; the split happens at the first
/// colon so variant prefixes (other db indexes, event channels) decode
/// the same way. Non-UTF-8 bytes are replaced rather than rejected.
pub fn key_from_channel(channel: &[u8]) -> String {
    let text = String::from_utf8_lossy(channel).to_lowercase();
    match text.split_once(':') {
        Some((_, key)) => key.to_owned(),
        None => text,
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
