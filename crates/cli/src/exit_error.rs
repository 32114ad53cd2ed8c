// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that end the process with a specific exit code.
//!
//! Commands return `ExitError` through `anyhow` instead of calling
//! `std::process::exit()`, so `main()` decides how to terminate.

use std::fmt;
use std::path::Path;

/// Exit code when another process holds the log lock
pub const EXIT_LOCKED: u8 = 2;
/// Exit code when the target is not a purr log
pub const EXIT_NOT_A_LOG: u8 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: u8,
    pub message: String,
}

impl ExitError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn locked(logdir: &Path, holder: &str) -> Self {
        Self::new(EXIT_LOCKED, format!("{} is in use by {holder}", logdir.display()))
    }

    pub fn not_a_log(path: &Path) -> Self {
        Self::new(EXIT_NOT_A_LOG, format!("{} is not a purr log", path.display()))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}
