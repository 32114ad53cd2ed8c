// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The purrer: one attached log directory and the watchers feeding it.
//!
//! Attaching takes an exclusive advisory lock on `<logdir>/.purrlock`, loads
//! the existing entries and rebuilds the per-filename policy memory from
//! them. Each [`Purrer::rescan`] then polls every watcher once and turns the
//! paths they report into unsaved [`DataProduct`]s.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use purr_core::{
    basename, canonize_path, mtime_secs, BusyGuard, Classification, Clock, PatternSet, Policy, PurrConfig,
    SystemClock, WatchState,
};
use purr_storage::{
    is_valid_pathname, load_log_entries, read_log_header, write_log_index, DataProduct, DirConfig, EntryEnv, EntryLinks,
    IgnoreList, LogEntry, SaveReport, DIRCONFIG_FILE, IGNORELIST_FILE, INDEX_FILE,
};

use crate::error::{AttachError, PurrerError};
use crate::watcher::{WatchedDir, WatchedFile, WatchedSubdir, Watcher};

pub const LOCK_FILE: &str = ".purrlock";

/// Remembered disposition of a filename, from the latest entry holding it
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultProps {
    pub policy: Policy,
    pub filename: String,
    pub comment: String,
}

/// Outcome of one [`Purrer::rescan`]
#[derive(Debug, Default)]
pub struct ScanResult {
    /// New or updated products, sorted by filename
    pub products: Vec<DataProduct>,
    /// Paths that became unreadable, each reported once per disappearance
    pub disappeared: Vec<PathBuf>,
}

fn lock_string() -> String {
    let host = hostname::get().map(|h| h.to_string_lossy().into_owned()).unwrap_or_else(|_| "localhost".into());
    format!("{host}:{}", std::process::id())
}

/// Open and lock `path` without blocking, then record our identity in it
fn acquire_lock(path: &Path) -> Result<File, AttachError> {
    let lock_err = |source: std::io::Error| AttachError::LockFile { path: path.to_path_buf(), source };
    // No truncate: the current holder's identity must survive a failed attempt
    let mut file =
        OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path).map_err(lock_err)?;
    if let Err(e) = file.try_lock_exclusive() {
        if e.kind() != fs2::lock_contended_error().kind() {
            return Err(lock_err(e));
        }
        let mut holder = String::new();
        file.read_to_string(&mut holder).map_err(lock_err)?;
        return Err(AttachError::Locked { holder: holder.trim().to_string() });
    }
    file.set_len(0).map_err(lock_err)?;
    file.write_all(lock_string().as_bytes()).map_err(lock_err)?;
    file.sync_all().map_err(lock_err)?;
    Ok(file)
}

/// True if `path` looks like a log directory: it has a `dirconfig` file
/// or at least one entry directory
pub fn is_purrlog(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    if path.join(DIRCONFIG_FILE).exists() {
        return true;
    }
    std::fs::read_dir(path)
        .map(|listing| listing.filter_map(|e| e.ok()).any(|e| is_valid_pathname(&e.path())))
        .unwrap_or(false)
}

pub struct Purrer<C: Clock = SystemClock> {
    logdir: PathBuf,
    lock: Option<File>,
    logtitle: String,
    /// Baseline for new watchers; the time of the latest entry
    timestamp: f64,
    last_scan_timestamp: f64,
    /// Visible entries, sorted by timestamp
    entries: Vec<LogEntry>,
    watchers: BTreeMap<PathBuf, Watcher>,
    /// Paths reported since the last entry, watched for disappearance
    temp_watchers: BTreeMap<PathBuf, WatchedFile>,
    watching_state: BTreeMap<PathBuf, WatchState>,
    default_dp_props: HashMap<String, DefaultProps>,
    dirconfig: DirConfig,
    ignorelist: IgnoreList,
    patterns: PatternSet,
    slack: f64,
    clock: C,
    env: EntryEnv,
}

impl<C: Clock> std::fmt::Debug for Purrer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Purrer")
            .field("logdir", &self.logdir)
            .field("attached", &self.is_attached())
            .field("entries", &self.entries.len())
            .field("watchers", &self.watchers.len())
            .finish_non_exhaustive()
    }
}

impl<C: Clock> Purrer<C> {
    /// Attach to `logdir`, creating it if needed.
    ///
    /// Fails with [`AttachError::Locked`] if another process holds the log.
    pub fn attach(
        logdir: impl AsRef<Path>,
        config: &PurrConfig,
        clock: C,
        env: EntryEnv,
    ) -> Result<Self, AttachError> {
        let patterns = config.pattern_set()?;
        let logdir = canonize_path(logdir.as_ref());
        std::fs::create_dir_all(&logdir)
            .map_err(|source| AttachError::CreateDir { path: logdir.clone(), source })?;
        let lock = acquire_lock(&logdir.join(LOCK_FILE))?;

        let now = clock.epoch_secs();
        let header = read_log_header(&logdir);
        let mut purrer = Self {
            dirconfig: DirConfig::new(logdir.join(DIRCONFIG_FILE)),
            ignorelist: IgnoreList::new(logdir.join(IGNORELIST_FILE)),
            logdir,
            lock: Some(lock),
            logtitle: header.title,
            timestamp: header.timestamp.unwrap_or(now),
            last_scan_timestamp: now,
            entries: Vec::new(),
            watchers: BTreeMap::new(),
            temp_watchers: BTreeMap::new(),
            watching_state: BTreeMap::new(),
            default_dp_props: HashMap::new(),
            patterns,
            slack: config.mtime_slack,
            clock,
            env,
        };
        {
            let progress = std::sync::Arc::clone(&purrer.env.progress);
            let _busy = BusyGuard::new(progress.as_ref());
            purrer.load_entries();
            purrer.restore_watched_directories();
            purrer.rearm_ignored();
        }
        tracing::info!(
            logdir = %purrer.logdir.display(),
            title = %purrer.logtitle,
            entries = purrer.entries.len(),
            "attached log"
        );
        Ok(purrer)
    }

    fn load_entries(&mut self) {
        let loaded = match load_log_entries(&self.logdir, &self.env) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(logdir = %self.logdir.display(), error = %e, "cannot list log directory");
                return;
            }
        };
        for entry in &loaded {
            self.update_policies_from_products(entry.dps(), false);
        }
        if let Some(last) = loaded.last() {
            self.timestamp = self.timestamp.max(last.timestamp() as f64);
        }
        self.entries = loaded.into_iter().filter(|e| !e.is_ignore()).collect();
        self.relink();
    }

    fn restore_watched_directories(&mut self) {
        self.dirconfig = match DirConfig::load(self.logdir.join(DIRCONFIG_FILE)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable directory configuration");
                DirConfig::new(self.logdir.join(DIRCONFIG_FILE))
            }
        };
        let dirs: Vec<_> = self.dirconfig.dirs().collect();
        for (dir, state) in dirs {
            if let Err(e) = self.add_watched_directory_inner(&dir, Some(state), false) {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to restore watched directory");
            }
        }
    }

    /// Keep files the user already ignored from being proposed again
    fn rearm_ignored(&mut self) {
        let records = match self.ignorelist.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable ignore list");
                return;
            }
        };
        for (path, record) in records {
            if let Some(watcher) = self.watchers.get_mut(&path) {
                tracing::trace!(path = %path.display(), policy = %record.policy, "re-arming ignored file");
                watcher.file_mut().advance_mtime(record.timestamp as f64);
            }
        }
    }

    /// Release the lock. Safe to call more than once.
    pub fn detach(&mut self) {
        if let Some(lock) = self.lock.take() {
            if let Err(e) = FileExt::unlock(&lock) {
                tracing::debug!(error = %e, "unlock failed, closing lock file anyway");
            }
            tracing::info!(logdir = %self.logdir.display(), "detached log");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.lock.is_some()
    }

    fn ensure_attached(&self) -> Result<(), PurrerError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(PurrerError::NotAttached)
        }
    }

    pub fn logdir(&self) -> &Path {
        &self.logdir
    }

    pub fn log_title(&self) -> &str {
        &self.logtitle
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn set_log_title(&mut self, title: impl Into<String>, save: bool) -> Result<(), PurrerError> {
        self.logtitle = title.into();
        if save {
            self.save(None)?;
        }
        Ok(())
    }

    pub fn log_entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Mutable access for editing; follow with [`save_entry`](Self::save_entry)
    pub fn entry_mut(&mut self, id: &str) -> Option<&mut LogEntry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn default_props(&self, filename: &str) -> Option<&DefaultProps> {
        self.default_dp_props.get(filename)
    }

    /// Recompute prev/next/up links; returns indices whose links changed
    fn relink(&mut self) -> Vec<usize> {
        let hrefs: Vec<String> = self.entries.iter().map(LogEntry::rel_index_link).collect();
        let mut changed = Vec::new();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let links = EntryLinks {
                prev: i.checked_sub(1).and_then(|j| hrefs.get(j)).cloned(),
                next: hrefs.get(i + 1).cloned(),
                up: Some(format!("../{INDEX_FILE}")),
            };
            if entry.links() != &links {
                entry.set_links(links);
                changed.push(i);
            }
        }
        changed
    }

    fn regenerate(&mut self, indices: impl IntoIterator<Item = usize>) {
        for i in indices {
            if let Some(entry) = self.entries.get_mut(i) {
                if let Err(e) = entry.generate_index(0.0) {
                    tracing::warn!(entry = %entry.id(), error = %e, "failed to regenerate entry index");
                }
            }
        }
    }

    /// Save a new entry and add it to the log.
    ///
    /// Ignore-entries are saved but stay out of the visible list; their
    /// products only feed the policy memory and the ignore list.
    pub fn add_log_entry(&mut self, mut entry: LogEntry) -> Result<SaveReport, PurrerError> {
        self.ensure_attached()?;
        let progress = std::sync::Arc::clone(&self.env.progress);
        let _busy = BusyGuard::new(progress.as_ref());
        self.temp_watchers.clear();
        entry.set_env(self.env.clone());

        if entry.is_ignore() {
            let report = entry.save_in(&self.logdir, None)?;
            self.update_policies_from_products(entry.dps(), true);
            return Ok(report);
        }

        // one directory per second; nudge a clashing timestamp forward
        let mut ts = entry.timestamp();
        while self.entries.iter().any(|e| e.timestamp() == ts) {
            ts += 1;
        }
        if ts != entry.timestamp() {
            tracing::debug!(from = entry.timestamp(), to = ts, "entry timestamp taken, moving it");
            entry.update(None, None, None, Some(ts));
        }

        progress.message("Saving new log entry");
        entry.set_log_directory(&self.logdir);
        let pos = self.entries.partition_point(|e| e.timestamp() < ts);
        self.entries.insert(pos, entry);
        let changed = self.relink();
        let report = match self.entries.get_mut(pos).map(|e| e.save(None)) {
            Some(Ok(report)) => report,
            Some(Err(e)) => {
                self.entries.remove(pos);
                self.relink();
                return Err(e.into());
            }
            None => return Err(PurrerError::NotAttached),
        };
        self.timestamp = self.last_scan_timestamp;
        self.regenerate(changed.into_iter().filter(|&i| i != pos));

        let dps = self.entries.get(pos).map(|e| e.dps().to_vec()).unwrap_or_default();
        self.update_policies_from_products(&dps, true);
        self.save(None)?;
        Ok(report)
    }

    /// Re-save an edited entry, then the log index
    pub fn save_entry(&mut self, id: &str) -> Result<SaveReport, PurrerError> {
        self.ensure_attached()?;
        let entry = self.entries.iter_mut().find(|e| e.id() == id).ok_or_else(|| PurrerError::NoSuchEntry(id.into()))?;
        let report = entry.save(None)?;
        let dps = entry.dps().to_vec();
        self.update_policies_from_products(&dps, true);
        self.save(None)?;
        Ok(report)
    }

    /// Remove entries from the log and delete their directories.
    ///
    /// Neighbours are relinked so no entry points at a deleted one.
    pub fn delete_log_entries(&mut self, ids: &[&str]) -> Result<(), PurrerError> {
        self.ensure_attached()?;
        let (deleted, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| ids.contains(&e.id().as_str()));
        self.entries = kept;
        let changed = self.relink();
        self.regenerate(changed);
        self.save(None)?;
        for entry in deleted {
            tracing::info!(entry = %entry.id(), "deleting log entry");
            if let Err(e) = entry.remove_directory() {
                tracing::warn!(entry = %entry.id(), error = %e, "failed to remove entry directory");
            }
        }
        Ok(())
    }

    /// Write the top-level index. With `refresh`, every entry is re-rendered
    /// first.
    pub fn save(&mut self, refresh: Option<f64>) -> Result<(), PurrerError> {
        self.ensure_attached()?;
        if let Some(refresh) = refresh {
            for entry in &mut self.entries {
                if let Err(e) = entry.save(Some(refresh)) {
                    tracing::warn!(entry = %entry.id(), error = %e, "failed to refresh entry");
                }
            }
        }
        write_log_index(&self.logdir, &self.logtitle, self.timestamp, &mut self.entries, refresh.unwrap_or(0.0))
            .map_err(|source| PurrerError::Index { path: self.logdir.clone(), source })
    }

    /// Remember policies, names and comments from an entry's products
    pub fn update_policies_from_entry(&mut self, entry: &LogEntry, new: bool) {
        self.update_policies_from_products(entry.dps(), new);
    }

    fn update_policies_from_products(&mut self, dps: &[DataProduct], new: bool) {
        for dp in dps {
            let name = basename(&dp.sourcepath);
            tracing::trace!(file = %name, policy = %dp.policy(), "default policy");
            self.default_dp_props.insert(
                name,
                DefaultProps { policy: dp.policy(), filename: dp.filename.clone(), comment: dp.comment.clone() },
            );
            if dp.is_ignored() {
                if !new {
                    continue;
                }
                if let Ok(mtime) = mtime_secs(&dp.sourcepath) {
                    if let Err(e) = self.ignorelist.append(mtime as i64, dp.policy(), &dp.sourcepath) {
                        tracing::warn!(error = %e, "failed to record ignored file");
                    }
                }
            } else if let Some(watcher) = self.watchers.get_mut(&dp.sourcepath) {
                if let Some(ts) = dp.timestamp {
                    watcher.file_mut().advance_mtime(ts);
                }
            } else {
                tracing::trace!(path = %dp.sourcepath.display(), "watching archived source");
                let watcher =
                    WatchedFile::new(&dp.sourcepath, dp.quiet, dp.timestamp).slack(self.slack).survive_deletion(true);
                self.watchers.insert(dp.sourcepath.clone(), Watcher::File(watcher));
            }
        }
    }

    /// Start watching `path`. An already watched directory is left alone
    /// unless `state` is given.
    pub fn add_watched_directory(&mut self, path: &Path, state: Option<WatchState>) -> Result<(), PurrerError> {
        self.add_watched_directory_inner(path, state, true)
    }

    fn add_watched_directory_inner(
        &mut self,
        path: &Path,
        state: Option<WatchState>,
        save_config: bool,
    ) -> Result<(), PurrerError> {
        let dir = canonize_path(path);
        if matches!(self.watchers.get(&dir), Some(Watcher::Dir(_))) {
            return match state {
                Some(state) => self.set_watching_state_inner(&dir, state, save_config),
                None => Ok(()),
            };
        }
        let state = state.unwrap_or(WatchState::Watched);
        let wdir = WatchedDir::new(
            &dir,
            self.timestamp,
            self.patterns.watch().clone(),
            self.patterns.ignore().clone(),
            false,
        )
        .with_slack(self.slack);
        let Some(fileset) = wdir.fileset().cloned() else {
            tracing::warn!(dir = %dir.display(), "directory is not readable, not watching it");
            return self.set_watching_state_inner(&dir, WatchState::Removed, save_config);
        };
        tracing::debug!(dir = %dir.display(), state = ?state, "watching directory");

        for name in &fileset {
            let child = canonize_path(&dir.join(name));
            if self.patterns.is_watched(name) && !self.watchers.contains_key(&child) {
                let quiet = self.patterns.is_quiet(name);
                tracing::trace!(path = %child.display(), quiet, "watching file");
                let watcher = WatchedFile::new(&child, quiet, Some(self.timestamp)).slack(self.slack);
                self.watchers.insert(child.clone(), Watcher::File(watcher));
            }
            if child.is_dir() {
                if let Some(canaries) = self.patterns.subdir_canaries(name) {
                    let quiet = self.patterns.is_quiet(name);
                    tracing::trace!(path = %child.display(), quiet, "watching subdirectory");
                    let watcher =
                        WatchedSubdir::new(&child, self.timestamp, canaries.clone(), quiet).with_slack(self.slack);
                    self.watchers.insert(child, Watcher::Subdir(watcher));
                }
            }
        }
        self.watchers.insert(dir.clone(), Watcher::Dir(wdir));
        self.set_watching_state_inner(&dir, state, save_config)
    }

    /// Change and persist the watch state of a directory
    pub fn set_watching_state(&mut self, path: &Path, state: WatchState) -> Result<(), PurrerError> {
        self.set_watching_state_inner(&canonize_path(path), state, true)
    }

    fn set_watching_state_inner(&mut self, dir: &Path, state: WatchState, save: bool) -> Result<(), PurrerError> {
        self.watching_state.insert(dir.to_path_buf(), state);
        if self.dirconfig.get(dir) == Some(state) {
            return Ok(());
        }
        self.dirconfig.set(dir, state);
        if save {
            self.dirconfig.save()?;
        }
        Ok(())
    }

    pub fn watching_state(&self, path: &Path) -> Option<WatchState> {
        self.watching_state.get(&canonize_path(path)).copied()
    }

    /// Directories with their states, excluding removed ones
    pub fn watched_directories(&self) -> Vec<(PathBuf, WatchState)> {
        self.watching_state
            .iter()
            .filter(|(_, state)| **state != WatchState::Removed)
            .map(|(dir, state)| (dir.clone(), *state))
            .collect()
    }

    /// Poll every watcher once
    pub fn rescan(&mut self) -> ScanResult {
        let mut result = ScanResult::default();
        if !self.is_attached() {
            return result;
        }
        let now = self.clock.epoch_secs();
        self.last_scan_timestamp = now;
        let mut newstuff: BTreeMap<PathBuf, bool> = BTreeMap::new();

        let keys: Vec<PathBuf> = self.watchers.keys().cloned().collect();
        for key in keys {
            let Some(watcher) = self.watchers.get_mut(&key) else {
                continue;
            };
            let newfiles = match watcher.new_files(now) {
                Ok(newfiles) => newfiles,
                Err(e) => {
                    let file = watcher.file_mut();
                    let report = !file.disappeared;
                    file.disappeared = true;
                    if file.survive_deletion {
                        tracing::trace!(path = %key.display(), error = %e, "access error, still watching");
                    } else {
                        tracing::debug!(path = %key.display(), error = %e, "access error, no longer watching");
                        self.watchers.remove(&key);
                    }
                    if report {
                        result.disappeared.push(key);
                    }
                    continue;
                }
            };
            let watcher_quiet = watcher.is_quiet();
            for newfile in newfiles {
                // a file with its own watcher is reported by that watcher only
                if newfile != key && self.watchers.contains_key(&newfile) {
                    continue;
                }
                let Some(state) = newfile.parent().and_then(|dir| self.watching_state.get(dir)).copied() else {
                    continue;
                };
                if !state.is_active() {
                    continue;
                }
                let quiet = match self.patterns.classify(&basename(&newfile), state, watcher_quiet) {
                    Classification::Ineligible => continue,
                    c => c.is_quiet(),
                };
                tracing::debug!(path = %newfile.display(), quiet, "new data product");
                let merged = newstuff.entry(newfile.clone()).or_insert(true);
                *merged = *merged && quiet;
                self.temp_watchers.insert(newfile.clone(), WatchedFile::new(&newfile, false, None));
            }
        }

        self.temp_watchers.retain(|path, watcher| match watcher.is_updated() {
            Ok(_) => true,
            Err(_) => {
                tracing::debug!(path = %path.display(), "new data product disappeared");
                result.disappeared.push(path.clone());
                false
            }
        });

        result.products = self.make_data_products(newstuff, false, false);
        result
    }

    /// Build unsaved products for `(path, quiet)` pairs, applying the
    /// remembered policy of each filename. Banished files are dropped unless
    /// `unbanish`; ignored ones become `Copy` if `unignore`.
    pub fn make_data_products<I, P>(&self, files: I, unbanish: bool, unignore: bool) -> Vec<DataProduct>
    where
        I: IntoIterator<Item = (P, bool)>,
        P: AsRef<Path>,
    {
        let mut seen = HashSet::new();
        let mut dps = Vec::new();
        for (path, quiet) in files {
            let sourcepath = canonize_path(path.as_ref());
            if !seen.insert(sourcepath.clone()) {
                continue;
            }
            let name = basename(path.as_ref());
            let props = self.default_dp_props.get(&name).cloned().unwrap_or(DefaultProps {
                policy: Policy::Copy,
                filename: name,
                comment: String::new(),
            });
            let policy = match props.policy {
                Policy::Banish if unbanish => Policy::Copy,
                Policy::Banish => continue,
                Policy::Ignore if unignore => Policy::Copy,
                other => other,
            };
            dps.push(
                DataProduct::new(&sourcepath)
                    .filename(props.filename)
                    .comment(props.comment)
                    .with_policy(policy)
                    .quiet(quiet),
            );
        }
        dps.sort_by(|a, b| a.filename.cmp(&b.filename));
        dps
    }
}

#[cfg(test)]
#[path = "purrer_tests.rs"]
mod tests;
