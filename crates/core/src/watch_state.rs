// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-directory watching state.

use serde::{Deserialize, Serialize};

/// How closely a directory is watched.
///
/// The ordering matters: everything at or below `Unwatched` is skipped during
/// a rescan, and everything below `Pounce` reports its new files quietly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum WatchState {
    /// Removed from the watch list
    Removed,
    /// Listed, but new files are not reported
    Unwatched,
    /// New files are recorded quietly
    Watched,
    /// New files are proposed to the user immediately
    Pounce,
}

impl WatchState {
    /// Integer code used in the `dirconfig` file
    pub fn code(self) -> i32 {
        match self {
            WatchState::Removed => -1,
            WatchState::Unwatched => 0,
            WatchState::Watched => 1,
            WatchState::Pounce => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(WatchState::Removed),
            0 => Some(WatchState::Unwatched),
            1 => Some(WatchState::Watched),
            2 => Some(WatchState::Pounce),
            _ => None,
        }
    }

    /// True if new files in this directory are reported at all
    pub fn is_active(self) -> bool {
        self > WatchState::Unwatched
    }
}

impl From<WatchState> for i32 {
    fn from(state: WatchState) -> i32 {
        state.code()
    }
}

impl TryFrom<i32> for WatchState {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        WatchState::from_code(code).ok_or_else(|| format!("unknown watching state {code}"))
    }
}

crate::simple_display! {
    WatchState {
        Removed => "removed",
        Unwatched => "unwatched",
        Watched => "watched",
        Pounce => "pounce",
    }
}

#[cfg(test)]
#[path = "watch_state_tests.rs"]
mod tests;
