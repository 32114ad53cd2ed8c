// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! purr-storage: on-disk model of a purr log
//!
//! A log directory holds one subdirectory per entry plus a few bookkeeping
//! files:
//!
//! - `entry-YYYYMMDD-HHMMSS/` with `index.html`, archived products and an
//!   `index.include.html` render cache
//! - `ignore-YYYYMMDD-HHMMSS/` recording ignore/banish decisions
//! - `index.html` (and `fullindex.html` for larger logs)
//! - `dirconfig`, `ignorelist`, `.purrlock`

pub mod archive;
pub mod dirconfig;
pub mod entry;
mod error;
pub mod html;
pub mod ignorelist;
pub mod index;
pub mod product;
pub mod render;

pub use dirconfig::{DirConfig, DIRCONFIG_FILE};
pub use entry::{
    entry_dir_name, is_valid_pathname, parse_dir_name, EntryEnv, EntryLinks, LogEntry, SaveReport,
    INCLUDE_CACHE_FILE, INDEX_FILE,
};
pub use error::{ArchiveError, ConfigFileError, DataProductError, EntryError};
pub use ignorelist::{IgnoreList, IgnoreRecord, IGNORELIST_FILE};
pub use index::{load_log_entries, read_log_header, write_log_index, LogHeader, DEFAULT_LOG_TITLE, FULL_INDEX_FILE};
pub use product::{resolve_filename_conflicts, DataProduct, ProductEdit};
pub use render::{LinkRenderer, Renderer, RendererRegistry, LINK_RENDERER};
