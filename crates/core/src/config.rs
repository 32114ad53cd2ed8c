// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User configuration: filename patterns and polling parameters.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{
    make_pattern_list, parse_pattern_list, parse_subdir_pattern_list, PatternError, PatternGroup,
    PatternList, PatternSet,
};

pub const DEFAULT_WATCH_PATTERNS: &str = "Images=*fits,*FITS,*jpg,*png;TDL configuration=.tdl.conf";
pub const DEFAULT_QUIET_PATTERNS: &str = "TDL configuration=.tdl.conf";
pub const DEFAULT_IGNORE_PATTERNS: &str = "Hidden files=.*;Purr logs=*purrlog;MeqTree logs=meqtree.log;Python files=*.py*;Backup files=*~,*.bck;Measurement sets=*.MS,*.ms;CASA tables=table.f*,table.dat,table.info,table.lock";
pub const DEFAULT_SUBDIR_PATTERNS: &str = "MEP tables=*mep/funklets,table.dat";

/// Tolerance for filesystem timestamp truncation when comparing mtimes
pub const DEFAULT_MTIME_SLACK: f64 = 0.1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Pattern lists are kept in their textual form so the file stays editable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurrConfig {
    /// Files proposed as data products
    pub watch_patterns: String,
    /// Watched files reported without interrupting the user
    pub quiet_patterns: String,
    /// Files never reported unless they also match a watch pattern
    pub ignore_patterns: String,
    /// Subdirectories watched through canary files
    pub subdir_patterns: String,
    /// Interval between rescans
    pub poll_interval_ms: u64,
    /// Seconds an mtime must advance by to count as a modification
    pub mtime_slack: f64,
}

impl Default for PurrConfig {
    fn default() -> Self {
        Self {
            watch_patterns: DEFAULT_WATCH_PATTERNS.to_string(),
            quiet_patterns: DEFAULT_QUIET_PATTERNS.to_string(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS.to_string(),
            subdir_patterns: DEFAULT_SUBDIR_PATTERNS.to_string(),
            poll_interval_ms: 2000,
            mtime_slack: DEFAULT_MTIME_SLACK,
        }
    }
}

impl PurrConfig {
    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read { path: path.display().to_string(), source })
            }
        };
        let config: Self = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
        // reject bad globs at load time rather than on first scan
        config.pattern_set()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text)
        };
        write().map_err(|source| ConfigError::Write { path: path.display().to_string(), source })
    }

    pub fn watch_groups(&self) -> Vec<PatternGroup> {
        parse_pattern_list(&self.watch_patterns)
    }

    pub fn ignore_groups(&self) -> Vec<PatternGroup> {
        parse_pattern_list(&self.ignore_patterns)
    }

    /// Replace the watch and ignore pattern groups
    pub fn set_watched_file_patterns(&mut self, watch: &[PatternGroup], ignore: &[PatternGroup]) {
        self.watch_patterns = make_pattern_list(watch);
        self.ignore_patterns = make_pattern_list(ignore);
        tracing::debug!(watch = %self.watch_patterns, ignore = %self.ignore_patterns, "pattern lists updated");
    }

    /// Compile all pattern groups
    pub fn pattern_set(&self) -> Result<PatternSet, PatternError> {
        Ok(PatternSet::new(
            PatternList::from_groups(&parse_pattern_list(&self.watch_patterns))?,
            PatternList::from_groups(&parse_pattern_list(&self.quiet_patterns))?,
            PatternList::from_groups(&parse_pattern_list(&self.ignore_patterns))?,
            parse_subdir_pattern_list(&self.subdir_patterns)?,
        ))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    crate::setters! {
        into {
            watch_patterns: String,
            quiet_patterns: String,
            ignore_patterns: String,
            subdir_patterns: String,
        }
        set {
            poll_interval_ms: u64,
            mtime_slack: f64,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
