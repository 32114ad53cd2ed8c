// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `purr watch` - poll directories and report (or archive) new data products

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use purr_core::{Clock, PurrConfig, SystemClock, WatchState};
use purr_storage::LogEntry;

use crate::output::format_product;

#[derive(Args)]
pub struct WatchArgs {
    /// Log directory (created if missing)
    pub logdir: PathBuf,

    /// Directories to add to the log's watch list
    pub dirs: Vec<PathBuf>,

    /// Pounce on new files in the given directories instead of watching quietly
    #[arg(long, conflicts_with = "unwatched")]
    pub pounce: bool,

    /// Add the given directories without watching them
    #[arg(long)]
    pub unwatched: bool,

    /// Save each batch of non-quiet products as a new entry
    #[arg(long)]
    pub archive: bool,

    /// Title for archived entries
    #[arg(long, default_value = "New data products", requires = "archive")]
    pub title: String,

    /// Stop after this many scans
    #[arg(long)]
    pub scans: Option<u64>,
}

impl WatchArgs {
    fn state(&self) -> Option<WatchState> {
        if self.pounce {
            Some(WatchState::Pounce)
        } else if self.unwatched {
            Some(WatchState::Unwatched)
        } else {
            None
        }
    }
}

pub fn handle(args: WatchArgs, config: &PurrConfig) -> Result<()> {
    let mut purrer = super::attach(&args.logdir, config)?;
    tracing::info!(version = crate::VERSION, logdir = %purrer.logdir().display(), "attached");
    for dir in &args.dirs {
        purrer
            .add_watched_directory(dir, args.state())
            .with_context(|| format!("cannot watch {}", dir.display()))?;
    }
    for (dir, state) in purrer.watched_directories() {
        tracing::info!(dir = %dir.display(), state = ?state, "watching");
    }

    let interval = config.poll_interval();
    let mut scans = 0u64;
    loop {
        let scan = purrer.rescan();
        for path in &scan.disappeared {
            println!("! {}", path.display());
        }
        for dp in &scan.products {
            println!("{}", format_product(dp));
        }
        if args.archive {
            let loud: Vec<_> = scan.products.into_iter().filter(|dp| !dp.quiet && !dp.is_ignored()).collect();
            if !loud.is_empty() {
                let entry = LogEntry::new(SystemClock.epoch_secs() as i64, args.title.as_str(), "", loud);
                let report = purrer.add_log_entry(entry)?;
                for (path, e) in &report.failed {
                    tracing::warn!(path = %path.display(), error = %e, "not archived");
                }
                println!("saved {} product(s) to {}", report.archived.len(), purrer.logdir().display());
            }
        }
        scans += 1;
        if args.scans.is_some_and(|limit| scans >= limit) {
            break;
        }
        std::thread::sleep(interval);
    }
    purrer.detach();
    Ok(())
}
