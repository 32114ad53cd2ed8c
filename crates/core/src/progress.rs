// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress reporting capability handed to the purrer and log entries.
//!
//! Long filesystem operations (archiving, index generation) report what they
//! are doing through this trait; front-ends decide how to show it.

/// Receives progress messages and busy notifications
pub trait ProgressReporter: Send + Sync {
    /// Top-level progress message
    fn message(&self, msg: &str);

    /// Message subordinate to the previous top-level one
    fn sub_message(&self, msg: &str) {
        self.message(msg);
    }

    /// Called with `true` when a blocking operation starts and `false` when it ends
    fn busy(&self, _busy: bool) {}
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn message(&self, _msg: &str) {}
}

/// Forwards progress to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn message(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn sub_message(&self, msg: &str) {
        tracing::debug!("  {msg}");
    }
}

/// Marks a reporter busy for the lifetime of the guard
pub struct BusyGuard<'a> {
    reporter: &'a dyn ProgressReporter,
}

impl<'a> BusyGuard<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter) -> Self {
        reporter.busy(true);
        Self { reporter }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.reporter.busy(false);
    }
}

/// Records every message, for tests
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: parking_lot::Mutex<Vec<String>>,
    busy_depth: parking_lot::Mutex<i32>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingProgress {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy_depth.lock() > 0
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ProgressReporter for RecordingProgress {
    fn message(&self, msg: &str) {
        self.messages.lock().push(msg.to_string());
    }

    fn busy(&self, busy: bool) {
        *self.busy_depth.lock() += if busy { 1 } else { -1 };
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
