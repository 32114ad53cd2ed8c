// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use purr_core::PatternError;
use purr_storage::{ConfigFileError, EntryError};
use thiserror::Error;

/// Errors attaching to a log directory
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The lock file could not be opened, locked or written
    #[error("failed to lock {path}: {source}")]
    LockFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Another process is attached; `holder` is its `hostname:pid`
    #[error("log is locked by {holder}")]
    Locked { holder: String },
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

#[derive(Debug, Error)]
pub enum PurrerError {
    #[error("not attached to a log")]
    NotAttached,
    #[error("no log entry {0}")]
    NoSuchEntry(String),
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write log index in {path}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),
}
