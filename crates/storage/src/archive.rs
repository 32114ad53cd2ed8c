// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native filesystem operations used to archive data products.
//!
//! Files are copied with their modification time preserved, so the archived
//! copy carries the timestamp of the original. Directories are bundled into a
//! gzip-compressed tarball whose single top-level member is the directory.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// True if both paths name the same file on the same device
#[cfg(unix)]
pub fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Remove a file, symlink or whole directory tree. A missing path is not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copy `from` to `to` unless `to` is already at least as new.
///
/// Permissions and modification time are carried over.
pub fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    let src_meta = fs::metadata(from)?;
    let src_mtime = FileTime::from_last_modification_time(&src_meta);
    if let Ok(dst_meta) = fs::metadata(to) {
        if FileTime::from_last_modification_time(&dst_meta) >= src_mtime {
            tracing::debug!(from = %from.display(), to = %to.display(), "destination is up to date");
            return Ok(());
        }
    }
    fs::copy(from, to)?;
    let atime = FileTime::from_last_access_time(&src_meta);
    filetime::set_file_times(to, atime, src_mtime)
}

/// Move `from` to `to`, falling back to copy-and-delete across devices.
///
/// The source is only deleted once the copy is in place with the same size.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => {
            tracing::debug!(from = %from.display(), error = %e, "rename failed, copying instead");
        }
    }
    copy_file(from, to)?;
    let copied = fs::metadata(to)?.len();
    let original = fs::metadata(from)?.len();
    if copied != original {
        return Err(io::Error::other(format!(
            "copied {copied} bytes of {original}, keeping the source"
        )));
    }
    fs::remove_file(from)
}

/// Write `dir` as a gzipped tarball at `bundle`.
///
/// The tarball holds a single top-level directory named like `dir`, so it
/// unpacks back into place when extracted next to the original.
pub fn bundle_dir(dir: &Path, bundle: &Path) -> io::Result<()> {
    let name = dir
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "directory has no name"))?;
    let file = fs::File::create(bundle)?;
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    tar.follow_symlinks(false);
    tar.append_dir_all(name, dir)?;
    let encoder = tar.into_inner()?;
    encoder.finish()?.sync_all()
}

/// Extract a bundle written by [`bundle_dir`] into `parent`
pub fn unpack_bundle(bundle: &Path, parent: &Path) -> io::Result<()> {
    let file = fs::File::open(bundle)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_mtime(true);
    archive.set_preserve_permissions(true);
    archive.unpack(parent)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
