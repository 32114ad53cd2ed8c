// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disposition of a data product.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// What happens to a data product when its entry is saved.
///
/// `Copy`, `Move`, `Ignore` and `Banish` apply to products that have not
/// been archived yet. `Keep` and `Remove` apply to archived products only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Copy,
    Move,
    Ignore,
    Banish,
    Keep,
    Remove,
}

impl Policy {
    /// Ignored products are never copied into the archive
    pub fn is_ignored(self) -> bool {
        matches!(self, Policy::Ignore | Policy::Banish)
    }

    /// Policies that may be chosen for a product that is not yet archived
    pub fn applies_to_new(self) -> bool {
        matches!(self, Policy::Copy | Policy::Move | Policy::Ignore | Policy::Banish)
    }

    /// Policies that may be chosen for an archived product
    pub fn applies_to_archived(self) -> bool {
        matches!(self, Policy::Keep | Policy::Remove)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Copy => "copy",
            Policy::Move => "move",
            Policy::Ignore => "ignore",
            Policy::Banish => "banish",
            Policy::Keep => "keep",
            Policy::Remove => "remove",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown data product policy {0:?}")]
pub struct PolicyParseError(pub String);

impl FromStr for Policy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(Policy::Copy),
            "ignore" => Ok(Policy::Ignore),
            "banish" => Ok(Policy::Banish),
            "keep" => Ok(Policy::Keep),
            "remove" => Ok(Policy::Remove),
            // older logs wrote variants such as "move-update"
            s if s.starts_with("move") => Ok(Policy::Move),
            other => Err(PolicyParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
