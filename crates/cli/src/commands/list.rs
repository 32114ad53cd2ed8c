// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `purr list` - print the entries of a log

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use purr_engine::is_purrlog;
use purr_storage::{load_log_entries, read_log_header, EntryEnv};

use crate::exit_error::ExitError;
use crate::output::format_entry;

#[derive(Args)]
pub struct ListArgs {
    /// Log directory
    pub logdir: PathBuf,
}

/// Reads the log without locking it, so it works while `purr watch` runs
pub fn handle(args: ListArgs) -> Result<()> {
    if !is_purrlog(&args.logdir) {
        return Err(ExitError::not_a_log(&args.logdir).into());
    }
    let header = read_log_header(&args.logdir);
    let entries = load_log_entries(&args.logdir, &EntryEnv::default())
        .with_context(|| format!("cannot read {}", args.logdir.display()))?;
    println!("{}", header.title);
    for (i, entry) in entries.iter().filter(|e| !e.is_ignore()).enumerate() {
        println!("{}", format_entry(i, entry));
    }
    Ok(())
}
