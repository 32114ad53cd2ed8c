// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filename pattern groups and classification.
//!
//! Pattern lists are written as `Description=patt,patt;Description=patt`.
//! Subdirectory patterns add a canary part: `Description=dirpatt/canary,canary`.

use glob::Pattern;
use thiserror::Error;

use crate::WatchState;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid filename pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// A described group of shell-glob patterns, e.g. `Images=*fits,*png`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternGroup {
    pub description: String,
    pub patterns: Vec<String>,
}

impl PatternGroup {
    pub fn new(description: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            description: description.into(),
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Parse `Description=patt,patt;Description=patt` into groups.
///
/// Segments without an `=` are skipped.
pub fn parse_pattern_list(text: &str) -> Vec<PatternGroup> {
    text.split(';')
        .filter_map(|segment| {
            let (desc, patts) = segment.rsplit_once('=')?;
            Some(PatternGroup {
                description: desc.to_string(),
                patterns: patts.split(',').map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Inverse of [`parse_pattern_list`]. Separator characters are dropped from
/// descriptions and patterns.
pub fn make_pattern_list(groups: &[PatternGroup]) -> String {
    let clean = |s: &str| s.replace([';', ','], "");
    groups
        .iter()
        .map(|g| {
            let patts: Vec<String> = g.patterns.iter().map(|p| clean(p)).collect();
            format!("{}={}", clean(&g.description), patts.join(","))
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Compiled list of glob patterns matched against bare filenames
#[derive(Debug, Clone, Default)]
pub struct PatternList(Vec<Pattern>);

impl PatternList {
    pub fn compile<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, PatternError> {
        let mut compiled = Vec::new();
        for patt in patterns {
            if patt.is_empty() {
                continue;
            }
            let p = Pattern::new(patt)
                .map_err(|source| PatternError::Invalid { pattern: patt.to_string(), source })?;
            compiled.push(p);
        }
        Ok(Self(compiled))
    }

    pub fn from_groups(groups: &[PatternGroup]) -> Result<Self, PatternError> {
        Self::compile(groups.iter().flat_map(|g| g.patterns.iter().map(String::as_str)))
    }

    pub fn matches(&self, filename: &str) -> bool {
        self.0.iter().any(|p| p.matches(filename))
    }
}

/// A group of subdirectories watched through their canary files
#[derive(Debug, Clone)]
pub struct SubdirPattern {
    pub description: String,
    pub dir_patterns: PatternList,
    pub canary_patterns: PatternList,
}

/// Parse `Description=dirpatt,dirpatt/canary,canary;...`
pub fn parse_subdir_pattern_list(text: &str) -> Result<Vec<SubdirPattern>, PatternError> {
    let mut out = Vec::new();
    for segment in text.split(';') {
        let Some((desc, rest)) = segment.split_once('=') else {
            continue;
        };
        let Some((dirs, canaries)) = rest.rsplit_once('/') else {
            tracing::debug!(segment, "subdirectory pattern has no canary part, skipping");
            continue;
        };
        out.push(SubdirPattern {
            description: desc.to_string(),
            dir_patterns: PatternList::compile(dirs.split(','))?,
            canary_patterns: PatternList::compile(canaries.split(','))?,
        });
    }
    Ok(out)
}

/// How a discovered file should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Matches an ignore pattern and no watch pattern
    Ineligible,
    /// Reported without interrupting the user
    Quiet,
    /// Reported and proposed to the user
    Loud,
}

impl Classification {
    pub fn is_quiet(self) -> bool {
        self == Classification::Quiet
    }
}

/// All configured pattern groups
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    watch: PatternList,
    quiet: PatternList,
    ignore: PatternList,
    subdirs: Vec<SubdirPattern>,
}

impl PatternSet {
    pub fn new(
        watch: PatternList,
        quiet: PatternList,
        ignore: PatternList,
        subdirs: Vec<SubdirPattern>,
    ) -> Self {
        Self { watch, quiet, ignore, subdirs }
    }

    pub fn watch(&self) -> &PatternList {
        &self.watch
    }

    pub fn ignore(&self) -> &PatternList {
        &self.ignore
    }

    pub fn is_watched(&self, filename: &str) -> bool {
        self.watch.matches(filename)
    }

    pub fn is_quiet(&self, filename: &str) -> bool {
        self.quiet.matches(filename)
    }

    /// A watch pattern overrides an ignore pattern
    pub fn is_eligible(&self, filename: &str) -> bool {
        !self.ignore.matches(filename) || self.watch.matches(filename)
    }

    /// Classify a file reported by one watcher.
    ///
    /// Directories below `Pounce` always report quietly, as do watchers
    /// explicitly tagged quiet. Callers AND the result across watchers.
    pub fn classify(&self, filename: &str, dir_state: WatchState, watcher_quiet: bool) -> Classification {
        if !self.is_eligible(filename) {
            return Classification::Ineligible;
        }
        if watcher_quiet || dir_state < WatchState::Pounce || self.is_quiet(filename) {
            Classification::Quiet
        } else {
            Classification::Loud
        }
    }

    /// Canary patterns of the first subdirectory group `dirname` belongs to
    pub fn subdir_canaries(&self, dirname: &str) -> Option<&PatternList> {
        self.subdirs
            .iter()
            .find(|s| s.dir_patterns.matches(dirname))
            .map(|s| &s.canary_patterns)
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
