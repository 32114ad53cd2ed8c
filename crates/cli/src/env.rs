// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the purr binary.

use std::path::{Path, PathBuf};

/// Resolve the config file: `--config` > PURR_CONFIG > XDG_CONFIG_HOME/purr > ~/.config/purr
pub fn config_path(cli: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli {
        return Some(path.to_path_buf());
    }
    resolve_config_path(
        std::env::var("PURR_CONFIG").ok(),
        std::env::var("XDG_CONFIG_HOME").ok(),
        std::env::var("HOME").ok(),
    )
}

fn resolve_config_path(purr_config: Option<String>, xdg: Option<String>, home: Option<String>) -> Option<PathBuf> {
    if let Some(path) = purr_config.filter(|s| !s.is_empty()) {
        return Some(PathBuf::from(path));
    }
    if let Some(xdg) = xdg.filter(|s| !s.is_empty()) {
        return Some(PathBuf::from(xdg).join("purr/purr.toml"));
    }
    home.map(|home| PathBuf::from(home).join(".config/purr/purr.toml"))
}

/// Log filter directive: PURR_LOG, then RUST_LOG
pub fn log_filter() -> Option<String> {
    std::env::var("PURR_LOG").ok().or_else(|| std::env::var("RUST_LOG").ok()).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
