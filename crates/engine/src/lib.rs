// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! purr-engine: watching directories and keeping a log
//!
//! [`Purrer`] owns one attached log directory: it holds the lock, keeps the
//! entry list linked and indexed, remembers per-filename policies, and polls
//! a set of [`Watcher`]s for new data products.

mod error;
pub mod purrer;
pub mod watcher;

pub use error::{AttachError, PurrerError};
pub use purrer::{is_purrlog, DefaultProps, Purrer, ScanResult, LOCK_FILE};
pub use watcher::{WatchedDir, WatchedFile, WatchedSubdir, Watcher};
