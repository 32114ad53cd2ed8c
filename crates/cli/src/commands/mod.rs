// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod list;
pub mod title;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use purr_core::{PurrConfig, SystemClock, TracingProgress};
use purr_engine::{AttachError, Purrer};
use purr_storage::EntryEnv;

use crate::exit_error::ExitError;

/// Attach to `logdir`, turning lock contention into a clean exit
pub(crate) fn attach(logdir: &Path, config: &PurrConfig) -> Result<Purrer> {
    let env = EntryEnv { progress: std::sync::Arc::new(TracingProgress), ..EntryEnv::default() };
    match Purrer::attach(logdir, config, SystemClock, env) {
        Ok(purrer) => Ok(purrer),
        Err(AttachError::Locked { holder }) => Err(ExitError::locked(logdir, &holder).into()),
        Err(e) => Err(e).with_context(|| format!("cannot attach to {}", logdir.display())),
    }
}
