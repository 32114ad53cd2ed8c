// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted watch state of every directory a log watches.
//!
//! Stored as TOML under the log directory, one table per absolute path:
//!
//! ```toml
//! ["/home/user/reduction"]
//! watching = 2
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use purr_core::WatchState;
use serde::{Deserialize, Serialize};

use crate::error::ConfigFileError;

pub const DIRCONFIG_FILE: &str = "dirconfig";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Section {
    watching: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirConfig {
    path: PathBuf,
    dirs: BTreeMap<String, WatchState>,
}

impl DirConfig {
    /// Empty configuration stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), dirs: BTreeMap::new() }
    }

    /// Load `path`; a missing file is an empty configuration.
    ///
    /// Sections without a valid `watching` code are read as `Watched`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigFileError> {
        let path = path.into();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new(path)),
            Err(source) => return Err(ConfigFileError::Read { path, source }),
        };
        let sections: BTreeMap<String, Section> = match toml::from_str(&text) {
            Ok(sections) => sections,
            Err(source) => return Err(ConfigFileError::Parse { path, source }),
        };
        let dirs = sections
            .into_iter()
            .map(|(dir, section)| {
                let state = section.watching.and_then(WatchState::from_code).unwrap_or_else(|| {
                    tracing::warn!(dir, code = ?section.watching, "bad watch state, assuming watched");
                    WatchState::Watched
                });
                (dir, state)
            })
            .collect();
        Ok(Self { path, dirs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, dir: &Path) -> Option<WatchState> {
        self.dirs.get(dir.to_string_lossy().as_ref()).copied()
    }

    /// Record `state` for `dir`; `Removed` deletes the section
    pub fn set(&mut self, dir: &Path, state: WatchState) {
        let key = dir.to_string_lossy().into_owned();
        if state == WatchState::Removed {
            self.dirs.remove(&key);
        } else {
            self.dirs.insert(key, state);
        }
    }

    /// All recorded directories, in path order
    pub fn dirs(&self) -> impl Iterator<Item = (PathBuf, WatchState)> + '_ {
        self.dirs.iter().map(|(dir, state)| (PathBuf::from(dir), *state))
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        let sections: BTreeMap<&str, Section> = self
            .dirs
            .iter()
            .map(|(dir, state)| (dir.as_str(), Section { watching: Some(state.code()) }))
            .collect();
        let text = toml::to_string(&sections)
            .map_err(|source| ConfigFileError::Serialize { path: self.path.clone(), source })?;
        std::fs::write(&self.path, text)
            .map_err(|source| ConfigFileError::Write { path: self.path.clone(), source })
    }
}

#[cfg(test)]
#[path = "dirconfig_tests.rs"]
mod tests;
