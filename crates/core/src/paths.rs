// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path and timestamp helpers.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Absolute, normalized path with symlinks resolved as far as the path exists.
///
/// Paths that do not exist (yet) are resolved through their nearest existing
/// ancestor, so a file that disappears keeps the same canonical name.
pub fn canonize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    let normalized = normalize(&absolute);
    if let Ok(real) = normalized.canonicalize() {
        return real;
    }
    // resolve the longest existing prefix, then re-append the rest
    let mut tail = Vec::new();
    let mut head = normalized.as_path();
    while let Some(parent) = head.parent() {
        if let Some(name) = head.file_name() {
            tail.push(name.to_os_string());
        }
        if let Ok(real) = parent.canonicalize() {
            let mut out = real;
            for name in tail.iter().rev() {
                out.push(name);
            }
            return out;
        }
        head = parent;
    }
    normalized
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Seconds since the epoch, as used for all timestamps in the log
pub fn system_time_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Modification time of `path` in epoch seconds
pub fn mtime_secs(path: &Path) -> io::Result<f64> {
    Ok(system_time_secs(std::fs::metadata(path)?.modified()?))
}

/// Inode change time of `path` in epoch seconds (creation time where there is no ctime)
#[cfg(unix)]
pub fn ctime_secs(path: &Path) -> io::Result<f64> {
    use std::os::unix::fs::MetadataExt;
    let meta = std::fs::metadata(path)?;
    Ok(meta.ctime() as f64 + meta.ctime_nsec() as f64 * 1e-9)
}

/// Inode change time of `path` in epoch seconds (creation time where there is no ctime)
#[cfg(not(unix))]
pub fn ctime_secs(path: &Path) -> io::Result<f64> {
    let meta = std::fs::metadata(path)?;
    Ok(system_time_secs(meta.created().or_else(|_| meta.modified())?))
}

/// Final component of `path` as a string, empty if there is none
pub fn basename(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
