// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log entries: a titled, commented, timestamped set of data products stored
//! in its own `entry-YYYYMMDD-HHMMSS` directory.
//!
//! The entry's `index.html` is both its rendering and its storage: loading
//! an entry parses the metadata anchors back out of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local, TimeZone, Utc};
use purr_core::{
    basename, canonize_path, mtime_secs, sanitize_filename, BusyGuard, NullProgress, Policy, ProgressReporter,
};
use regex::Regex;

use crate::archive;
use crate::error::{ArchiveError, EntryError};
use crate::html;
use crate::product::{self, DataProduct, ProductEdit};
use crate::render::RendererRegistry;

pub const INDEX_FILE: &str = "index.html";
pub const INCLUDE_CACHE_FILE: &str = "index.include.html";

const MALFORMED_TITLE: &str = "Malformed entry, probably needs to be deleted";
const IGNORE_TITLE: &str = "This is not a real log entry";
const IGNORE_COMMENT: &str = "This entry was saved because some data products were ignored or banished. \
It records those decisions and does not appear in the log.";

#[allow(clippy::expect_used)]
static ENTRY_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(entry|ignore)-(\d{8})-(\d{6})$").expect("constant regex pattern is valid")
});

/// Services an entry needs while saving and rendering
#[derive(Clone)]
pub struct EntryEnv {
    pub renderers: Arc<RendererRegistry>,
    pub progress: Arc<dyn ProgressReporter>,
}

impl Default for EntryEnv {
    fn default() -> Self {
        Self { renderers: Arc::new(RendererRegistry::default()), progress: Arc::new(NullProgress) }
    }
}

impl std::fmt::Debug for EntryEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryEnv").field("renderers", &self.renderers).finish_non_exhaustive()
    }
}

/// Navigation links written into an entry's index, as relative hrefs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLinks {
    pub prev: Option<String>,
    pub next: Option<String>,
    pub up: Option<String>,
}

impl EntryLinks {
    fn is_empty(&self) -> bool {
        self.prev.is_none() && self.next.is_none() && self.up.is_none()
    }
}

/// What a save did, product by product
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Archived paths of products stored by this save
    pub archived: Vec<PathBuf>,
    /// Filenames of archived products deleted by this save
    pub removed: Vec<String>,
    /// Sources that vanished before they could be archived
    pub skipped: Vec<PathBuf>,
    /// Products that failed to archive; they are dropped from the entry
    pub failed: Vec<(PathBuf, ArchiveError)>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Directory name for an entry: `entry-YYYYMMDD-HHMMSS` in local time
pub fn entry_dir_name(ignore: bool, timestamp: i64) -> String {
    let prefix = if ignore { "ignore" } else { "entry" };
    format!("{prefix}-{}", format_local(timestamp, "%Y%m%d-%H%M%S"))
}

fn format_local(timestamp: i64, fmt: &str) -> String {
    match Local.timestamp_opt(timestamp, 0).earliest() {
        Some(t) => t.format(fmt).to_string(),
        None => DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|t| t.format(fmt).to_string())
            .unwrap_or_default(),
    }
}

/// `Some(ignore)` if `name` follows the entry directory convention
pub fn parse_dir_name(name: &str) -> Option<bool> {
    ENTRY_DIR.captures(name).and_then(|caps| caps.get(1)).map(|kind| kind.as_str() == "ignore")
}

/// True for an existing directory named like an entry
pub fn is_valid_pathname(path: &Path) -> bool {
    path.is_dir() && parse_dir_name(&basename(path)).is_some()
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    timestamp: i64,
    title: String,
    /// Stored form: one paragraph per line, see [`html::reflow_comment`]
    comment: String,
    dps: Vec<DataProduct>,
    ignore: bool,
    pathname: Option<PathBuf>,
    links: EntryLinks,
    cached_include_valid: bool,
    updated: bool,
    env: EntryEnv,
}

impl LogEntry {
    /// A new, unsaved entry. `comment` is text as typed by the user.
    pub fn new(timestamp: i64, title: impl Into<String>, comment: &str, dps: Vec<DataProduct>) -> Self {
        Self {
            timestamp,
            title: title.into(),
            comment: html::reflow_comment(comment),
            dps,
            ignore: false,
            pathname: None,
            links: EntryLinks::default(),
            cached_include_valid: false,
            updated: true,
            env: EntryEnv::default(),
        }
    }

    /// An entry that only records ignore and banish decisions.
    ///
    /// Every unsaved product becomes `Ignore` unless it is already `Banish`.
    pub fn new_ignore(timestamp: i64, dps: Vec<DataProduct>) -> Self {
        let dps = dps
            .into_iter()
            .map(|dp| {
                if dp.is_archived() || dp.policy() == Policy::Banish {
                    dp
                } else {
                    dp.with_policy(Policy::Ignore)
                }
            })
            .collect();
        let mut entry = Self::new(timestamp, "", "", dps);
        entry.ignore = true;
        entry
    }

    pub fn with_env(mut self, env: EntryEnv) -> Self {
        self.env = env;
        self
    }

    pub fn set_env(&mut self, env: EntryEnv) {
        self.env = env;
    }

    /// Directory name: the real one once the entry has a directory,
    /// otherwise derived from the ignore flag and timestamp
    pub fn id(&self) -> String {
        match &self.pathname {
            Some(path) => basename(path),
            None => entry_dir_name(self.ignore, self.timestamp),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Comment in stored form
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Comment as the user would edit it
    pub fn editable_comment(&self) -> String {
        html::editable_comment(&self.comment)
    }

    pub fn dps(&self) -> &[DataProduct] {
        &self.dps
    }

    pub fn is_ignore(&self) -> bool {
        self.ignore
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn pathname(&self) -> Option<&Path> {
        self.pathname.as_deref()
    }

    pub fn index_file(&self) -> Option<PathBuf> {
        self.pathname.as_ref().map(|p| p.join(INDEX_FILE))
    }

    fn include_cache(&self) -> Option<PathBuf> {
        self.pathname.as_ref().map(|p| p.join(INCLUDE_CACHE_FILE))
    }

    pub fn links(&self) -> &EntryLinks {
        &self.links
    }

    pub fn set_links(&mut self, links: EntryLinks) {
        self.links = links;
    }

    /// Link to this entry's index from a sibling entry directory
    pub fn rel_index_link(&self) -> String {
        format!("../{}/{INDEX_FILE}", self.id())
    }

    pub fn time_label(&self) -> String {
        format_local(self.timestamp, "%Y-%m-%d %H:%M:%S")
    }

    /// Replace any of the entry's fields and mark it for saving
    pub fn update(
        &mut self,
        title: Option<String>,
        comment: Option<&str>,
        dps: Option<Vec<DataProduct>>,
        timestamp: Option<i64>,
    ) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(comment) = comment {
            self.comment = html::reflow_comment(comment);
        }
        if let Some(dps) = dps {
            self.dps = dps;
        }
        if let Some(timestamp) = timestamp {
            self.timestamp = timestamp;
        }
        self.updated = true;
    }

    /// Apply a user decision to the product at `index`. Returns true if
    /// anything changed.
    ///
    /// Archived products accept `Keep`/`Remove` and are renamed on disk at
    /// once; unsaved products accept the other policies and only change
    /// their future archive name.
    pub fn edit_product(&mut self, index: usize, edit: ProductEdit) -> Result<bool, EntryError> {
        let dp = self.dps.get_mut(index).ok_or(EntryError::NoSuchProduct(index))?;
        let mut changed = false;
        if let Some(policy) = edit.policy {
            if dp.is_archived() {
                let was_removed = dp.is_marked_for_removal();
                dp.set_retention(policy)?;
                changed |= was_removed != dp.is_marked_for_removal();
            } else if dp.policy() != policy {
                dp.set_policy(policy)?;
                changed = true;
            }
        }
        if let Some(name) = edit.rename {
            if dp.is_archived() {
                changed |= dp.rename(&name)?;
            } else if dp.filename != name {
                dp.filename = name;
                changed = true;
            }
        }
        if let Some(comment) = edit.comment {
            if dp.comment != comment {
                dp.comment = comment;
                changed = true;
            }
        }
        if let Some(render) = edit.render {
            if dp.render.as_deref() != Some(render.as_str()) {
                dp.render = Some(render);
                changed = true;
            }
        }
        if changed {
            self.updated = true;
        }
        Ok(changed)
    }

    /// Make unsaved products' archive names unique; see
    /// [`product::resolve_filename_conflicts`]
    pub fn resolve_filename_conflicts(&mut self) -> bool {
        let changed = product::resolve_filename_conflicts(&mut self.dps);
        if changed {
            self.updated = true;
        }
        changed
    }

    /// Load an entry from its directory
    pub fn load(pathname: &Path, env: EntryEnv) -> Result<Self, EntryError> {
        let ignore = parse_dir_name(&basename(pathname))
            .filter(|_| pathname.is_dir())
            .ok_or_else(|| EntryError::NotAnEntry(pathname.to_path_buf()))?;
        let pathname = canonize_path(pathname);
        let index_file = pathname.join(INDEX_FILE);
        let text = std::fs::read_to_string(&index_file).map_err(EntryError::io(&index_file))?;
        let parsed = html::parse_entry(&text);

        let timestamp = match parsed.timestamp {
            Some(ts) => ts as i64,
            None => {
                tracing::warn!(path = %index_file.display(), "entry has no timestamp, using current time");
                Utc::now().timestamp()
            }
        };
        let mut dps = Vec::with_capacity(parsed.products.len());
        for attrs in &parsed.products {
            let dp = product_from_attributes(&pathname, attrs)
                .map_err(|message| EntryError::Parse { path: index_file.clone(), message })?;
            match &dp.fullpath {
                Some(path) if dp.is_archived() && !path.exists() => {
                    tracing::info!(path = %path.display(), "archived data product is gone, dropping it");
                }
                _ => dps.push(dp),
            }
        }

        let index_mtime = mtime_secs(&index_file).map_err(EntryError::io(&index_file))?;
        let youngest = env.renderers.youngest();
        let cache_mtime = mtime_secs(&pathname.join(INCLUDE_CACHE_FILE)).unwrap_or(0.0);
        let cached_include_valid = cache_mtime >= youngest.max(index_mtime);
        tracing::debug!(path = %pathname.display(), cached_include_valid, "loaded log entry");

        Ok(Self {
            timestamp,
            title: parsed.title.unwrap_or_else(|| MALFORMED_TITLE.to_string()),
            comment: parsed.comment.unwrap_or_default(),
            dps,
            ignore,
            pathname: Some(pathname),
            links: EntryLinks::default(),
            cached_include_valid,
            updated: youngest > index_mtime,
            env,
        })
    }

    /// Place the entry under `logdir`; the directory name follows from the timestamp
    pub fn set_log_directory(&mut self, logdir: &Path) {
        self.pathname = Some(logdir.join(entry_dir_name(self.ignore, self.timestamp)));
    }

    /// [`set_log_directory`](Self::set_log_directory) then [`save`](Self::save)
    pub fn save_in(&mut self, logdir: &Path, refresh: Option<f64>) -> Result<SaveReport, EntryError> {
        self.set_log_directory(logdir);
        self.save(refresh)
    }

    /// Archive pending products and rewrite the index.
    ///
    /// A no-op unless the entry is updated or `refresh` is given; `refresh`
    /// makes renderers regenerate sub-products older than it. Failures of
    /// single products are collected in the report, never returned.
    pub fn save(&mut self, refresh: Option<f64>) -> Result<SaveReport, EntryError> {
        let mut report = SaveReport::default();
        if refresh.is_none() && !self.updated {
            return Ok(report);
        }
        let pathname = self.pathname.clone().ok_or(EntryError::NoPathname)?;
        let progress = Arc::clone(&self.env.progress);
        let _busy = BusyGuard::new(progress.as_ref());
        progress.message(&format!("Rendering entry for {}", self.time_label()));

        std::fs::create_dir_all(&pathname).map_err(EntryError::io(&pathname))?;
        let pathname = canonize_path(&pathname);
        self.pathname = Some(pathname.clone());

        // removals first, so their names are free for the rest
        let (removed, mut kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.dps).into_iter().partition(|dp| dp.is_marked_for_removal());
        for dp in removed {
            if let Err(e) = dp.remove_file().and_then(|_| dp.remove_subproducts()) {
                tracing::warn!(filename = %dp.filename, error = %e, "failed to remove data product");
            }
            report.removed.push(dp.filename);
        }
        product::resolve_filename_conflicts(&mut kept);

        for mut dp in kept {
            if dp.is_archived() || dp.is_ignored() {
                self.dps.push(dp);
                continue;
            }
            if !dp.sourcepath.exists() {
                tracing::warn!(path = %dp.sourcepath.display(), "data product is missing, not saved");
                report.skipped.push(dp.sourcepath);
                continue;
            }
            progress.sub_message(&format!("archiving {}", dp.filename));
            match dp.archive_into(&pathname) {
                Ok(()) => {
                    report.archived.extend(dp.fullpath.clone());
                    self.dps.push(dp);
                }
                Err(e) => {
                    tracing::warn!(path = %dp.sourcepath.display(), error = %e, "data product not saved");
                    report.failed.push((dp.sourcepath, e));
                }
            }
        }

        self.cached_include_valid = false;
        self.generate_index(refresh.unwrap_or(0.0))?;
        self.updated = false;
        Ok(report)
    }

    /// Rewrite `index.html`
    pub fn generate_index(&mut self, refresh: f64) -> Result<(), EntryError> {
        let index_file = self.index_file().ok_or(EntryError::NoPathname)?;
        let html = self.render_index(None, refresh);
        std::fs::write(&index_file, html).map_err(EntryError::io(&index_file))
    }

    /// HTML for this entry.
    ///
    /// With `relpath == None` this is the complete `index.html`, including
    /// the machine-readable anchors. With `Some(relpath)` it is a fragment
    /// for the top-level index, with links prefixed by `relpath`; the
    /// fragment is cached in `index.include.html` and reused while the cache
    /// is newer than `refresh`.
    pub fn render_index(&mut self, relpath: Option<&str>, refresh: f64) -> String {
        if relpath.is_some() && self.cached_include_valid {
            if let Some(html) = self.read_include_cache(refresh) {
                return html;
            }
            self.cached_include_valid = false;
        }

        let (title, comment) = if self.ignore {
            (IGNORE_TITLE.to_string(), IGNORE_COMMENT.to_string())
        } else {
            (self.title.clone(), self.comment.clone())
        };
        let title = html::escape(&title);
        let mut out = String::new();

        match relpath {
            None => {
                out.push_str(&format!("<HTML><BODY>\n      <TITLE>{title}</TITLE>\n"));
                if !self.links.is_empty() {
                    let link = |href: &Option<String>, label: &str| {
                        href.as_ref()
                            .map(|h| format!("<A HREF=\"{}\">{label}</A>", html::quote_url(h)))
                            .unwrap_or_default()
                    };
                    out.push_str(&format!(
                        "<DIV ALIGN=right><P>{} {} {}</P></DIV>\n",
                        link(&self.links.prev, "&lt;&lt;Previous"),
                        link(&self.links.up, "Up"),
                        link(&self.links.next, "Next&gt;&gt;"),
                    ));
                }
                out.push_str(&format!(
                    "<H2><A CLASS=\"TITLE\" TIMESTAMP={}>{title}</A></H2>\n",
                    self.timestamp
                ));
            }
            Some(_) => {
                out.push_str(&format!("\n        <HR WIDTH=100%>\n        <H2>{title}</H2>\n"));
            }
        }

        out.push_str(&format!(
            "        <DIV ALIGN=right><P><SMALL>Logged on {}</SMALL></P></DIV>\n\n",
            self.time_label()
        ));
        out.push_str("        <A CLASS=\"COMMENTS\">\n");
        out.push_str(&html::render_comment(&comment));
        out.push_str("    </A>\n");

        let have_real_dps = self.dps.iter().any(|dp| !dp.is_ignored());
        if have_real_dps {
            out.push_str("\n        <H3>Data products</H3>\n        <TABLE BORDER=1 FRAME=box RULES=all CELLPADDING=5>\n");
        }
        for dp in &self.dps {
            let renderer = self.env.renderers.get(dp.render.as_deref());
            if relpath.is_none() {
                out.push_str(&product_anchor(dp, renderer.name()));
            }
            if !dp.is_ignored() {
                out.push_str(&renderer.render_row(dp, relpath.unwrap_or(""), refresh));
            }
        }
        if have_real_dps {
            out.push_str("        </TABLE>\n");
        }

        match relpath {
            None => out.push_str("</BODY></HTML>\n"),
            Some(_) => self.write_include_cache(&out),
        }
        out
    }

    fn read_include_cache(&self, refresh: f64) -> Option<String> {
        let cache = self.include_cache()?;
        match mtime_secs(&cache) {
            Ok(mtime) if mtime >= refresh => match std::fs::read_to_string(&cache) {
                Ok(html) => Some(html),
                Err(e) => {
                    tracing::warn!(path = %cache.display(), error = %e, "failed to read include cache");
                    None
                }
            },
            _ => {
                tracing::debug!(path = %cache.display(), "include cache out of date");
                None
            }
        }
    }

    fn write_include_cache(&mut self, html: &str) {
        let Some(cache) = self.include_cache() else {
            return;
        };
        match std::fs::write(&cache, html) {
            Ok(()) => self.cached_include_valid = true,
            Err(e) => tracing::warn!(path = %cache.display(), error = %e, "failed to write include cache"),
        }
    }

    /// Delete the entry directory and everything archived in it
    pub fn remove_directory(&self) -> Result<(), EntryError> {
        let Some(pathname) = &self.pathname else {
            return Ok(());
        };
        tracing::info!(path = %pathname.display(), "removing log entry");
        archive::remove_path(pathname).map_err(EntryError::io(pathname))
    }
}

fn product_anchor(dp: &DataProduct, render: &str) -> String {
    let src = html::escape(&dp.sourcepath.to_string_lossy());
    let comment = html::escape(&dp.comment);
    if dp.is_ignored() {
        return format!(
            "          <A CLASS=\"DP\" SRC=\"{src}\" POLICY=\"{}\" COMMENT=\"{comment}\"></A>\n",
            dp.policy()
        );
    }
    format!(
        "          <A CLASS=\"DP\" FILENAME=\"{}\" SRC=\"{src}\" POLICY=\"{}\" QUIET={} TIMESTAMP={:.6} RENDER=\"{}\" COMMENT=\"{comment}\"></A>\n",
        html::escape(&dp.filename),
        dp.policy(),
        u8::from(dp.quiet),
        dp.timestamp.unwrap_or(0.0),
        html::escape(render),
    )
}

fn product_from_attributes(
    entry_dir: &Path,
    attrs: &HashMap<String, String>,
) -> Result<DataProduct, String> {
    let src = attrs.get("SRC").ok_or("data product anchor has no SRC")?;
    let policy: Policy = match attrs.get("POLICY") {
        Some(p) => p.parse().map_err(|e| format!("{e}"))?,
        None => Policy::Copy,
    };
    let mut dp = match attrs.get("FILENAME") {
        Some(filename) => {
            DataProduct::archived_at(PathBuf::from(src), entry_dir.join(sanitize_filename(filename)), policy)
        }
        None => DataProduct::new(src).with_policy(policy),
    };
    if let Some(comment) = attrs.get("COMMENT") {
        dp.comment = comment.clone();
    }
    dp.quiet = attrs.get("QUIET").and_then(|q| q.parse::<i64>().ok()).is_some_and(|q| q != 0);
    dp.timestamp = attrs.get("TIMESTAMP").and_then(|t| t.parse::<f64>().ok());
    dp.render = attrs.get("RENDER").filter(|r| !r.is_empty() && r.as_str() != "None").cloned();
    Ok(dp)
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
