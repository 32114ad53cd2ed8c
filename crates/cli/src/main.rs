// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! purr: keep a logbook of data-reduction products

mod commands;
mod env;
mod exit_error;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use purr_core::PurrConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::exit_error::ExitError;

/// Package version plus the git hash it was built from
pub(crate) const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("PURR_BUILD_HASH"));

#[derive(Parser)]
#[command(name = "purr", version = VERSION, about = "Watch directories and log data-reduction products")]
struct Cli {
    /// Config file (default: PURR_CONFIG, then ~/.config/purr/purr.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch directories for new data products
    Watch(commands::watch::WatchArgs),
    /// List the entries of a log
    List(commands::list::ListArgs),
    /// Show or set the title of a log
    Title(commands::title::TitleArgs),
}

fn init_logging(log_file: Option<&Path>, verbose: u8) -> Result<Option<WorkerGuard>> {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = env::log_filter().map(EnvFilter::new).unwrap_or_else(|| EnvFilter::new(default));
    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        return Ok(None);
    };
    let name = path.file_name().ok_or_else(|| anyhow!("invalid log file {}", path.display()))?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}

fn load_config(cli: Option<&Path>) -> Result<PurrConfig> {
    match env::config_path(cli) {
        Some(path) => PurrConfig::load(&path).with_context(|| format!("bad config {}", path.display())),
        None => Ok(PurrConfig::default()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Watch(args) => commands::watch::handle(args, &config),
        Command::List(args) => commands::list::handle(args),
        Command::Title(args) => commands::title::handle(args, &config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match init_logging(cli.log_file.as_deref(), cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("purr: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("purr: {exit}");
                ExitCode::from(exit.code)
            }
            None => {
                eprintln!("purr: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
