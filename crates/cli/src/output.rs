// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text formatting for command output.

use purr_core::Policy;
use purr_storage::{DataProduct, LogEntry};

/// One line per entry: time, directory name, title and product count
pub fn format_entry(index: usize, entry: &LogEntry) -> String {
    let count = entry.dps().iter().filter(|dp| !dp.is_ignored()).count();
    let products = match count {
        0 => String::new(),
        1 => "  (1 product)".to_string(),
        n => format!("  ({n} products)"),
    };
    format!("{:>3}. {}  {}  {}{products}", index + 1, entry.time_label(), entry.id(), entry.title())
}

/// A product as shown while watching
pub fn format_product(dp: &DataProduct) -> String {
    let mut line = format!("{} {}", policy_marker(dp.policy()), dp.sourcepath.display());
    if dp.filename != purr_core::basename(&dp.sourcepath) {
        line.push_str(&format!(" -> {}", dp.filename));
    }
    if dp.quiet {
        line.push_str(" (quiet)");
    }
    line
}

fn policy_marker(policy: Policy) -> &'static str {
    match policy {
        Policy::Copy => "+",
        Policy::Move => ">",
        Policy::Ignore | Policy::Banish => "-",
        Policy::Keep | Policy::Remove => "=",
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
