// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the on-disk log model.

use std::io;
use std::path::PathBuf;

use purr_core::Policy;
use thiserror::Error;

/// Failure to place one data product into the archive (or back out of it)
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source {0} no longer exists")]
    MissingSource(PathBuf),
    #[error("failed to remove {path}, which is in the way: {source}")]
    InTheWay {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to bundle {from} into {to}: {source}")]
    Bundle {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to unpack {from} into {to}: {source}")]
    Unpack {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Misuse of a data product, or a failed operation on an archived one
#[derive(Debug, Error)]
pub enum DataProductError {
    #[error("data product {0} has not been archived")]
    NotArchived(String),
    #[error("data product {filename} is archived; its policy cannot become {policy}")]
    Archived { filename: String, policy: Policy },
    #[error("policy {policy} does not apply to unsaved data product {filename}")]
    InvalidPolicy { filename: String, policy: Policy },
    #[error("data product {0} cannot be renamed to an empty name")]
    InvalidName(String),
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} exists and would be overwritten")]
    SourceExists(PathBuf),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Loading or saving a log entry failed as a whole
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("{0} is not a log entry directory")]
    NotAnEntry(PathBuf),
    #[error("cannot save entry: no log directory set")]
    NoPathname,
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("no data product at index {0}")]
    NoSuchProduct(usize),
    #[error(transparent)]
    Product(#[from] DataProductError),
}

impl EntryError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| EntryError::Io { path, source }
    }
}

/// Reading or writing one of the per-log bookkeeping files
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}
