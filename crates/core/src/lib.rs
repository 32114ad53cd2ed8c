// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! purr-core: shared types for the purr data-reduction logbook

pub mod macros;

pub mod clock;
pub mod config;
pub mod filename;
pub mod paths;
pub mod pattern;
pub mod policy;
pub mod progress;
pub mod watch_state;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, PurrConfig};
pub use filename::{make_unique_filename, sanitize_filename, split_extension};
pub use paths::{basename, canonize_path, ctime_secs, mtime_secs, system_time_secs};
pub use pattern::{
    make_pattern_list, parse_pattern_list, parse_subdir_pattern_list, Classification, PatternError, PatternGroup,
    PatternList, PatternSet, SubdirPattern,
};
pub use policy::{Policy, PolicyParseError};
#[cfg(any(test, feature = "test-support"))]
pub use progress::RecordingProgress;
pub use progress::{BusyGuard, NullProgress, ProgressReporter, TracingProgress};
pub use watch_state::WatchState;
