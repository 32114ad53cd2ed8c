// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive filename helpers.

use std::collections::HashSet;

const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Split `name` into stem and extension (including the dot).
///
/// Leading dots never start an extension: `.bashrc` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if !name[..idx].chars().all(|c| c == '.') => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Return `name`, or `stem-N.ext` for the smallest N that is not in `taken`.
/// The returned name is added to `taken`.
pub fn make_unique_filename(taken: &mut HashSet<String>, name: &str) -> String {
    let mut unique = name.to_string();
    if taken.contains(&unique) {
        let (stem, ext) = split_extension(name);
        let mut num = 1;
        loop {
            unique = format!("{stem}-{num}{ext}");
            if !taken.contains(&unique) {
                break;
            }
            num += 1;
        }
    }
    taken.insert(unique.clone());
    unique
}

/// Replace characters that are illegal on common filesystems, and path
/// separators, with `_` and strip a leading dot.
pub fn sanitize_filename(name: &str) -> String {
    let out: String = name.chars().map(|c| if ILLEGAL_CHARS.contains(&c) { '_' } else { c }).collect();
    match out.strip_prefix('.') {
        Some(rest) => rest.to_string(),
        None => out,
    }
}

#[cfg(test)]
#[path = "filename_tests.rs"]
mod tests;
