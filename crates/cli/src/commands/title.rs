// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `purr title` - show or change the log title

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use purr_core::PurrConfig;

#[derive(Args)]
pub struct TitleArgs {
    /// Log directory
    pub logdir: PathBuf,

    /// New title; prints the current one if omitted
    pub title: Option<String>,
}

pub fn handle(args: TitleArgs, config: &PurrConfig) -> Result<()> {
    let mut purrer = super::attach(&args.logdir, config)?;
    match args.title {
        Some(title) => {
            purrer.set_log_title(title, true)?;
            tracing::info!(title = %purrer.log_title(), "log title set");
        }
        None => println!("{}", purrer.log_title()),
    }
    purrer.detach();
    Ok(())
}
