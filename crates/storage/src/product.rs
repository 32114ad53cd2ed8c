// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data products: files proposed for, or placed into, a log entry.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use purr_core::{basename, canonize_path, make_unique_filename, mtime_secs, sanitize_filename, Policy};

use crate::archive;
use crate::error::{ArchiveError, DataProductError};

/// Suffix of the directory holding rendered sub-products (thumbnails etc.)
pub const SUBPRODUCT_SUFFIX: &str = ".purr-products";

/// Suffix given to directories bundled into the archive
pub const BUNDLE_SUFFIX: &str = ".tgz";

/// One file or directory belonging to a log entry
#[derive(Debug, Clone, PartialEq)]
pub struct DataProduct {
    /// Canonical path of the original
    pub sourcepath: PathBuf,
    /// Name inside the entry directory
    pub filename: String,
    /// Path inside the entry directory, once archived
    pub fullpath: Option<PathBuf>,
    policy: Policy,
    pub comment: String,
    /// Name of the renderer used for this product
    pub render: Option<String>,
    /// Modification time of the archived copy
    pub timestamp: Option<f64>,
    /// Watched quietly: updates are recorded without interrupting the user
    pub quiet: bool,
    archived: bool,
    marked_for_removal: bool,
}

impl DataProduct {
    /// An unsaved product for `sourcepath`, archived under its own basename
    pub fn new(sourcepath: impl AsRef<Path>) -> Self {
        let sourcepath = canonize_path(sourcepath.as_ref());
        let filename = basename(&sourcepath);
        Self {
            sourcepath,
            filename,
            fullpath: None,
            policy: Policy::Copy,
            comment: String::new(),
            render: None,
            timestamp: None,
            quiet: false,
            archived: false,
            marked_for_removal: false,
        }
    }

    /// A product that is already stored in an entry directory
    pub(crate) fn archived_at(sourcepath: PathBuf, fullpath: PathBuf, policy: Policy) -> Self {
        Self {
            filename: basename(&fullpath),
            sourcepath,
            fullpath: Some(fullpath),
            policy,
            comment: String::new(),
            render: None,
            timestamp: None,
            quiet: false,
            archived: true,
            marked_for_removal: false,
        }
    }

    /// Builder-style policy for unsaved products; policies that only apply
    /// to archived products fall back to `Copy`
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = if policy.applies_to_new() { policy } else { Policy::Copy };
        self
    }

    purr_core::setters! {
        into {
            filename: String,
            comment: String,
        }
        set {
            quiet: bool,
        }
        option {
            render: String,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    /// Ignored products stay in the entry's metadata but are never archived
    pub fn is_ignored(&self) -> bool {
        self.policy.is_ignored()
    }

    /// Change the policy of a product that has not been archived yet
    pub fn set_policy(&mut self, policy: Policy) -> Result<(), DataProductError> {
        if self.archived {
            return Err(DataProductError::Archived { filename: self.filename.clone(), policy });
        }
        if !policy.applies_to_new() {
            return Err(DataProductError::InvalidPolicy { filename: self.filename.clone(), policy });
        }
        self.policy = policy;
        Ok(())
    }

    /// Keep or remove an archived product; removal happens when the entry is saved
    pub fn set_retention(&mut self, policy: Policy) -> Result<(), DataProductError> {
        if !self.archived {
            return Err(DataProductError::NotArchived(self.filename.clone()));
        }
        if !policy.applies_to_archived() {
            return Err(DataProductError::Archived { filename: self.filename.clone(), policy });
        }
        self.marked_for_removal = policy == Policy::Remove;
        Ok(())
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Directory holding rendered sub-products of an archived product
    pub fn subproduct_dir(&self) -> Option<PathBuf> {
        let fullpath = self.fullpath.as_ref()?;
        let mut name = fullpath.as_os_str().to_os_string();
        name.push(SUBPRODUCT_SUFFIX);
        Some(PathBuf::from(name))
    }

    fn archived_path(&self) -> Result<&Path, DataProductError> {
        match (&self.fullpath, self.archived) {
            (Some(path), true) => Ok(path),
            _ => Err(DataProductError::NotArchived(self.filename.clone())),
        }
    }

    /// Copy, move or bundle the source into `entry_dir` according to the policy.
    ///
    /// Ignored and already archived products are left alone.
    pub fn archive_into(&mut self, entry_dir: &Path) -> Result<(), ArchiveError> {
        if self.archived || self.is_ignored() {
            return Ok(());
        }
        let source = canonize_path(&self.sourcepath);
        if !source.exists() {
            return Err(ArchiveError::MissingSource(source));
        }
        let dest = entry_dir.join(&self.filename);
        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            policy = %self.policy,
            "archiving data product"
        );

        if std::fs::symlink_metadata(&dest).is_ok() {
            if archive::same_file(&dest, &source) {
                tracing::debug!(path = %dest.display(), "source is already in the archive");
                return self.mark_archived(dest);
            }
            archive::remove_path(&dest)
                .map_err(|source| ArchiveError::InTheWay { path: dest.clone(), source })?;
        }

        if source.is_dir() {
            archive::bundle_dir(&source, &dest).map_err(|e| ArchiveError::Bundle {
                from: source.clone(),
                to: dest.clone(),
                source: e,
            })?;
            if self.policy == Policy::Move {
                if let Err(e) = archive::remove_path(&source) {
                    tracing::warn!(path = %source.display(), error = %e, "failed to remove moved directory");
                }
            }
        } else if self.policy == Policy::Move {
            archive::move_file(&source, &dest).map_err(|e| ArchiveError::Move {
                from: source.clone(),
                to: dest.clone(),
                source: e,
            })?;
        } else {
            archive::copy_file(&source, &dest).map_err(|e| ArchiveError::Copy {
                from: source.clone(),
                to: dest.clone(),
                source: e,
            })?;
        }
        self.mark_archived(dest)
    }

    fn mark_archived(&mut self, dest: PathBuf) -> Result<(), ArchiveError> {
        self.timestamp = Some(mtime_secs(&dest).map_err(|source| ArchiveError::Copy {
            from: self.sourcepath.clone(),
            to: dest.clone(),
            source,
        })?);
        self.fullpath = Some(dest);
        self.archived = true;
        Ok(())
    }

    /// Delete the archived file. Filesystem errors are logged, not returned.
    pub fn remove_file(&self) -> Result<(), DataProductError> {
        let path = self.archived_path()?;
        if let Err(e) = archive::remove_path(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove archived data product");
        }
        Ok(())
    }

    /// Delete everything rendered from this product
    pub fn remove_subproducts(&self) -> Result<(), DataProductError> {
        self.archived_path()?;
        if let Some(dir) = self.subproduct_dir() {
            if let Err(e) = archive::remove_path(&dir) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to remove subproducts");
            }
        }
        Ok(())
    }

    /// Rename the archived file. Returns `false` if `newname` is the current name.
    ///
    /// Rendered sub-products are keyed by filename and are deleted.
    pub fn rename(&mut self, newname: &str) -> Result<bool, DataProductError> {
        let newname = sanitize_filename(newname);
        if newname.is_empty() {
            return Err(DataProductError::InvalidName(self.filename.clone()));
        }
        if newname == self.filename {
            return Ok(false);
        }
        let oldpath = self.archived_path()?.to_path_buf();
        let newpath = oldpath.with_file_name(&newname);
        std::fs::rename(&oldpath, &newpath).map_err(|source| DataProductError::Rename {
            from: oldpath.clone(),
            to: newpath.clone(),
            source,
        })?;
        self.remove_subproducts()?;
        tracing::info!(from = %oldpath.display(), to = %newpath.display(), "renamed data product");
        self.fullpath = Some(newpath);
        self.filename = newname;
        Ok(true)
    }

    /// Put the archived copy back at `sourcepath`.
    ///
    /// An existing file or tree at `sourcepath` is deleted first when
    /// `overwrite` is set; otherwise it is an error.
    pub fn restore_from_archive(&self, overwrite: bool) -> Result<(), DataProductError> {
        let archived = self.archived_path()?;
        let target = &self.sourcepath;
        if std::fs::symlink_metadata(target).is_ok() {
            if !overwrite {
                return Err(DataProductError::SourceExists(target.clone()));
            }
            archive::remove_path(target)
                .map_err(|source| ArchiveError::InTheWay { path: target.clone(), source })?;
        }
        if archived.to_string_lossy().ends_with(BUNDLE_SUFFIX) {
            let parent = target.parent().unwrap_or_else(|| Path::new("/"));
            archive::unpack_bundle(archived, parent).map_err(|source| ArchiveError::Unpack {
                from: archived.to_path_buf(),
                to: parent.to_path_buf(),
                source,
            })?;
        } else {
            archive::copy_file(archived, target).map_err(|source| ArchiveError::Copy {
                from: archived.to_path_buf(),
                to: target.clone(),
                source,
            })?;
        }
        tracing::info!(path = %target.display(), "restored data product from archive");
        Ok(())
    }
}

/// A user decision about one product of an entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductEdit {
    pub policy: Option<Policy>,
    pub rename: Option<String>,
    pub comment: Option<String>,
    pub render: Option<String>,
}

impl ProductEdit {
    pub fn new() -> Self {
        Self::default()
    }

    purr_core::setters! {
        option {
            policy: Policy,
            rename: String,
            comment: String,
            render: String,
        }
    }
}

/// Make archive names of unsaved products unique within one entry.
///
/// Names of archived products are taken as given; unsaved, non-ignored
/// products are sanitized and numbered around them. Products marked for
/// removal free their names. Returns true if any name changed.
pub fn resolve_filename_conflicts(dps: &mut [DataProduct]) -> bool {
    let mut taken: HashSet<String> = dps
        .iter()
        .filter(|dp| dp.archived && !dp.marked_for_removal)
        .map(|dp| dp.filename.clone())
        .collect();
    let mut changed = false;
    for dp in dps.iter_mut().filter(|dp| !dp.archived && !dp.is_ignored()) {
        let mut name = sanitize_filename(&dp.filename);
        if name.is_empty() {
            name = "unnamed".to_string();
        }
        if dp.sourcepath.is_dir() && !name.ends_with(BUNDLE_SUFFIX) {
            name.push_str(BUNDLE_SUFFIX);
        }
        let unique = make_unique_filename(&mut taken, &name);
        if unique != dp.filename {
            tracing::debug!(from = %dp.filename, to = %unique, "renamed data product to avoid a conflict");
            dp.filename = unique;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
#[path = "product_tests.rs"]
mod tests;
