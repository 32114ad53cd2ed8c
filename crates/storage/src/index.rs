// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level log index.
//!
//! Small logs get a single `index.html` holding every entry. Once there are
//! more than [`TOC_THRESHOLD`] entries, `index.html` becomes a table of
//! contents and the concatenation moves to `fullindex.html`.

use std::io;
use std::path::Path;

use crate::entry::{is_valid_pathname, EntryEnv, LogEntry, INDEX_FILE};
use crate::html::{self, escape, quote_url};

pub const FULL_INDEX_FILE: &str = "fullindex.html";
pub const DEFAULT_LOG_TITLE: &str = "Unnamed log";

/// Largest log rendered without a table of contents
pub const TOC_THRESHOLD: usize = 5;

/// Title and timestamp recorded in a log's `index.html`
#[derive(Debug, Clone, PartialEq)]
pub struct LogHeader {
    pub title: String,
    pub timestamp: Option<f64>,
}

/// Read the header back from `logdir/index.html`. A missing or unreadable
/// index yields the default title.
pub fn read_log_header(logdir: &Path) -> LogHeader {
    let path = logdir.join(INDEX_FILE);
    let (title, timestamp) = match std::fs::read_to_string(&path) {
        Ok(text) => html::parse_title(&text),
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "failed to read log index, using defaults");
            }
            (None, None)
        }
    };
    LogHeader { title: title.unwrap_or_else(|| DEFAULT_LOG_TITLE.to_string()), timestamp }
}

fn header(title: &str, timestamp: f64) -> String {
    let title = escape(title);
    format!(
        "<HTML><BODY>\n\n      <TITLE>{title}</TITLE>\n\n      <H1><A CLASS=\"TITLE\" TIMESTAMP={timestamp:.6}>{title}</A></H1>\n\n"
    )
}

fn footer() -> String {
    format!(
        "<HR>\n<DIV ALIGN=right><I><SMALL>This log was generated by purr version {}.</SMALL></I></DIV>\n</BODY></HTML>\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Write the log's index files from its visible entries
pub fn write_log_index(
    logdir: &Path,
    title: &str,
    timestamp: f64,
    entries: &mut [LogEntry],
    refresh: f64,
) -> io::Result<()> {
    let toc_path = logdir.join(INDEX_FILE);
    let full_path = logdir.join(FULL_INDEX_FILE);

    let full_target = if entries.len() <= TOC_THRESHOLD {
        if let Err(e) = std::fs::remove_file(&full_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %full_path.display(), error = %e, "failed to remove stale full index");
            }
        }
        &toc_path
    } else {
        let mut toc = header(title, timestamp);
        toc.push_str(&format!(
            "<DIV ALIGN=right><P><A HREF={FULL_INDEX_FILE}>Printable version (single HTML page).</A></P></DIV>\n\n"
        ));
        for (i, entry) in entries.iter().enumerate() {
            let href = quote_url(&format!("{}/{INDEX_FILE}", entry.id()));
            toc.push_str(&format!("<P><A HREF=\"{href}\">{}. {}</A></P>\n\n", i + 1, escape(entry.title())));
        }
        toc.push_str(&footer());
        std::fs::write(&toc_path, toc)?;
        &full_path
    };

    let mut full = header(title, timestamp);
    for entry in entries.iter_mut() {
        let relpath = format!("{}/", entry.id());
        full.push_str(&entry.render_index(Some(&relpath), refresh));
    }
    full.push_str(&footer());
    std::fs::write(full_target, full)?;
    tracing::debug!(logdir = %logdir.display(), entries = entries.len(), "wrote log index");
    Ok(())
}

/// Load every entry directory under `logdir`, ignore-entries included,
/// sorted by timestamp. Unreadable entries are skipped with a warning.
pub fn load_log_entries(logdir: &Path, env: &EntryEnv) -> io::Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    for path in std::fs::read_dir(logdir)?.filter_map(|e| e.ok()).map(|e| e.path()) {
        if !is_valid_pathname(&path) {
            tracing::trace!(path = %path.display(), "not a log entry");
            continue;
        }
        match LogEntry::load(&path, env.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log entry"),
        }
    }
    entries.sort_by_key(LogEntry::timestamp);
    Ok(entries)
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
