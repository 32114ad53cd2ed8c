// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only record of ignore and banish decisions.
//!
//! Each line is `<mtime> <policy> <path>`. On attach the file is replayed so
//! that files the user already dismissed are not proposed again.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use purr_core::Policy;

use crate::error::ConfigFileError;

pub const IGNORELIST_FILE: &str = "ignorelist";

/// Latest decision recorded for one path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IgnoreRecord {
    /// Modification time of the file when it was ignored
    pub timestamp: i64,
    pub policy: Policy,
}

#[derive(Debug, Clone)]
pub struct IgnoreList {
    path: PathBuf,
}

impl IgnoreList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, timestamp: i64, policy: Policy, source: &Path) -> Result<(), ConfigFileError> {
        let write = || -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
            writeln!(file, "{timestamp} {policy} {}", source.display())
        };
        write().map_err(|source| ConfigFileError::Write { path: self.path.clone(), source })
    }

    /// Replay the file; the last line for a path wins. Malformed lines are
    /// skipped.
    pub fn load(&self) -> Result<HashMap<PathBuf, IgnoreRecord>, ConfigFileError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => return Err(ConfigFileError::Read { path: self.path.clone(), source }),
        };
        let mut records = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some((path, record)) => {
                    records.insert(path, record);
                }
                None => {
                    tracing::warn!(path = %self.path.display(), line = lineno + 1, "skipping malformed ignorelist line");
                }
            }
        }
        Ok(records)
    }
}

fn parse_line(line: &str) -> Option<(PathBuf, IgnoreRecord)> {
    let mut parts = line.splitn(3, ' ');
    let timestamp = parts.next()?.parse().ok()?;
    let policy = parts.next()?.parse().ok()?;
    let path = parts.next().filter(|p| !p.is_empty())?;
    Some((PathBuf::from(path), IgnoreRecord { timestamp, policy }))
}

#[cfg(test)]
#[path = "ignorelist_tests.rs"]
mod tests;
