// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling watchers.
//!
//! There is no filesystem notification: every scan tick each watcher stats
//! its path and compares modification times against a stored watermark.
//! A failed stat is reported as an `Err`, which the caller treats as the
//! path having disappeared.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use purr_core::config::DEFAULT_MTIME_SLACK;
use purr_core::{basename, ctime_secs, mtime_secs, PatternList};

/// Watches a single file (or directory) for modification
#[derive(Debug, Clone)]
pub struct WatchedFile {
    path: PathBuf,
    mtime: f64,
    slack: f64,
    /// Report changes without interrupting the user
    pub quiet: bool,
    /// Keep watching after the path disappears
    pub survive_deletion: bool,
    /// Set once a disappearance has been reported, cleared when the path is back
    pub disappeared: bool,
}

impl WatchedFile {
    /// Watch `path` starting from watermark `mtime`, or from the current
    /// modification time if `None` (0 if the path cannot be read)
    pub fn new(path: impl Into<PathBuf>, quiet: bool, mtime: Option<f64>) -> Self {
        let path = path.into();
        let mtime = mtime.unwrap_or_else(|| mtime_secs(&path).unwrap_or(0.0));
        Self { path, mtime, slack: DEFAULT_MTIME_SLACK, quiet, survive_deletion: false, disappeared: false }
    }

    purr_core::setters! {
        set {
            slack: f64,
            survive_deletion: bool,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored watermark
    pub fn mtime(&self) -> f64 {
        self.mtime
    }

    /// Raise the watermark to `mtime`; never lowers it
    pub fn advance_mtime(&mut self, mtime: f64) {
        self.mtime = self.mtime.max(mtime);
    }

    /// Move the watermark to `mtime` unconditionally
    pub fn restamp(&mut self, mtime: f64) {
        self.mtime = mtime;
    }

    /// True if the path was modified more than `slack` seconds past the
    /// watermark. The watermark then ratchets up to the current mtime, so a
    /// single modification is reported once.
    pub fn is_updated(&mut self) -> io::Result<bool> {
        let mtime = mtime_secs(&self.path)?;
        let updated = mtime > self.mtime + self.slack;
        self.advance_mtime(mtime);
        self.disappeared = false;
        Ok(updated)
    }

    /// The path itself if it was updated
    pub fn new_files(&mut self) -> io::Result<Vec<PathBuf>> {
        Ok(if self.is_updated()? { vec![self.path.clone()] } else { Vec::new() })
    }
}

fn list_dir(path: &Path) -> io::Result<BTreeSet<String>> {
    std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect()
}

/// Watches a directory for new children
#[derive(Debug, Clone)]
pub struct WatchedDir {
    file: WatchedFile,
    /// Last listing; `None` if the directory could not be read
    fileset: Option<BTreeSet<String>>,
    /// Children created since the baseline, found at construction
    pending: BTreeSet<String>,
    watch: PatternList,
    ignore: PatternList,
}

impl WatchedDir {
    /// Watch `path` with `mtime` as baseline.
    ///
    /// If the directory changed after the baseline, children created after
    /// it are queued so that the first poll reports them.
    pub fn new(path: impl Into<PathBuf>, mtime: f64, watch: PatternList, ignore: PatternList, quiet: bool) -> Self {
        let path = path.into();
        let fileset = match list_dir(&path) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot list directory");
                None
            }
        };
        let mut pending = BTreeSet::new();
        if let Some(set) = &fileset {
            if mtime_secs(&path).is_ok_and(|m| m > mtime) {
                for name in set {
                    match ctime_secs(&path.join(name)) {
                        Ok(ctime) if ctime > mtime => {
                            tracing::debug!(path = %path.display(), name, "created since last run");
                            pending.insert(name.clone());
                        }
                        _ => {}
                    }
                }
            }
        }
        Self { file: WatchedFile::new(path, quiet, Some(mtime)), fileset, pending, watch, ignore }
    }

    pub fn with_slack(mut self, slack: f64) -> Self {
        self.file.slack = slack;
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Names seen in the last listing
    pub fn fileset(&self) -> Option<&BTreeSet<String>> {
        self.fileset.as_ref()
    }

    pub fn file(&self) -> &WatchedFile {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut WatchedFile {
        &mut self.file
    }

    /// Children that appeared since the previous poll, minus ignored names
    /// (a watch pattern overrides an ignore pattern)
    pub fn new_files(&mut self) -> io::Result<Vec<PathBuf>> {
        if self.fileset.is_none() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "directory was not readable"));
        }
        self.file.is_updated()?;
        let listing = match list_dir(self.file.path()) {
            Ok(listing) => listing,
            Err(e) => {
                self.fileset = None;
                return Err(e);
            }
        };
        let mut names = std::mem::take(&mut self.pending);
        if let Some(previous) = &self.fileset {
            names.extend(listing.difference(previous).cloned());
        }
        self.fileset = Some(listing);
        Ok(names
            .into_iter()
            .filter(|name| !self.ignore.matches(name) || self.watch.matches(name))
            .map(|name| self.file.path().join(name))
            .collect())
    }
}

/// Watches a subdirectory as a single product, using canary files inside it
/// to detect changes
#[derive(Debug, Clone)]
pub struct WatchedSubdir {
    dir: WatchedDir,
    canary_patterns: PatternList,
    canaries: BTreeMap<PathBuf, WatchedFile>,
}

impl WatchedSubdir {
    pub fn new(path: impl Into<PathBuf>, mtime: f64, canary_patterns: PatternList, quiet: bool) -> Self {
        let dir = WatchedDir::new(path, mtime, PatternList::default(), PatternList::default(), quiet);
        let mut canaries = BTreeMap::new();
        for name in dir.fileset().into_iter().flatten() {
            if canary_patterns.matches(name) {
                let canary = dir.path().join(name);
                tracing::trace!(path = %canary.display(), "watching canary");
                canaries.insert(canary.clone(), WatchedFile::new(canary, false, Some(mtime)));
            }
        }
        Self { dir, canary_patterns, canaries }
    }

    pub fn with_slack(mut self, slack: f64) -> Self {
        self.dir = self.dir.with_slack(slack);
        for canary in self.canaries.values_mut() {
            canary.slack = slack;
        }
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn canaries(&self) -> impl Iterator<Item = &Path> {
        self.canaries.keys().map(PathBuf::as_path)
    }

    /// The subdirectory's own path if its listing or any canary changed.
    /// `now` stamps new canaries and re-stamps all of them after a change.
    pub fn new_files(&mut self, now: f64) -> io::Result<Vec<PathBuf>> {
        let slack = self.dir.file.slack;
        let newfiles = self.dir.new_files()?;
        let mut changed = !newfiles.is_empty();
        if changed {
            for path in newfiles {
                if self.canary_patterns.matches(&basename(&path)) {
                    tracing::trace!(path = %path.display(), "new canary");
                    let canary = WatchedFile::new(path.clone(), false, Some(now)).slack(slack);
                    self.canaries.insert(path, canary);
                }
            }
        } else {
            let mut gone = Vec::new();
            for (path, canary) in &mut self.canaries {
                match canary.is_updated() {
                    Ok(true) => {
                        tracing::trace!(path = %path.display(), "canary updated");
                        changed = true;
                        break;
                    }
                    Ok(false) => {}
                    Err(_) => gone.push(path.clone()),
                }
            }
            for path in gone {
                tracing::debug!(path = %path.display(), "canary is gone");
                self.canaries.remove(&path);
            }
            if changed {
                for canary in self.canaries.values_mut() {
                    canary.restamp(now);
                }
            }
        }
        Ok(if changed { vec![self.path().to_path_buf()] } else { Vec::new() })
    }
}

/// Any watcher the purrer polls
#[derive(Debug, Clone)]
pub enum Watcher {
    File(WatchedFile),
    Dir(WatchedDir),
    Subdir(WatchedSubdir),
}

impl Watcher {
    /// Paths this watcher reports as new or changed since the last poll
    pub fn new_files(&mut self, now: f64) -> io::Result<Vec<PathBuf>> {
        match self {
            Watcher::File(w) => w.new_files(),
            Watcher::Dir(w) => w.new_files(),
            Watcher::Subdir(w) => w.new_files(now),
        }
    }

    /// The underlying file watcher (the directory itself for directory watchers)
    pub fn file(&self) -> &WatchedFile {
        match self {
            Watcher::File(w) => w,
            Watcher::Dir(w) => &w.file,
            Watcher::Subdir(w) => &w.dir.file,
        }
    }

    pub fn file_mut(&mut self) -> &mut WatchedFile {
        match self {
            Watcher::File(w) => w,
            Watcher::Dir(w) => &mut w.file,
            Watcher::Subdir(w) => &mut w.dir.file,
        }
    }

    pub fn path(&self) -> &Path {
        self.file().path()
    }

    pub fn is_quiet(&self) -> bool {
        self.file().quiet
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
