// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disk spool for telemetry events that could not be delivered.
//!
//! The spool is a newline-delimited JSON file: one full event payload per
//! line, appended when a batch send fails and consumed from the head on
//! replay. All I/O errors are absorbed; the spool is best-effort by design.

use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A batch read from the head of the spool, plus the lines to keep if the
/// re-send succeeds.
#[derive(Debug)]
pub struct SpoolBatch {
    pub payloads: Vec<Value>,
    remaining: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Spool {
    path: PathBuf,
}

impl Spool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append payloads as JSONL. Failures are logged and swallowed.
    pub fn append(&self, payloads: &[Value]) {
        if payloads.is_empty() {
            return;
        }
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                for payload in payloads {
                    writeln!(file, "{payload}")?;
                }
                Ok(())
            });
        if let Err(err) = result {
            tracing::warn!(spool = %self.path.display(), error = %err, "failed to spool events");
        }
    }

    /// Read up to `limit` parseable payloads from the head of the spool.
    ///
    /// Returns `None` when the spool is absent or empty. Unparseable lines
    /// within the head window are discarded.
    pub fn read_head(&self, limit: usize) -> Option<SpoolBatch> {
        if !self.path.exists() {
            return None;
        }
        let text = std::fs::read_to_string(&self.path).ok()?;
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return None;
        }
        let taken = limit.min(lines.len());
        let payloads: Vec<Value> = lines[..taken]
            .iter()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter(|value| value.is_object())
            .collect();
        let remaining: Vec<String> = lines[taken..].iter().map(|l| l.to_string()).collect();
        Some(SpoolBatch {
            payloads,
            remaining,
        })
    }

    /// Rewrite the spool with the given remainder after a successful replay
    /// (or after dropping an unparseable head window).
    pub fn commit(&self, batch: &SpoolBatch) {
        let body = if batch.remaining.is_empty() {
            String::new()
        } else {
            let mut body = batch.remaining.join("\n");
            body.push('\n');
            body
        };
        if let Err(err) = std::fs::write(&self.path, body) {
            tracing::warn!(spool = %self.path.display(), error = %err, "failed to rewrite spool");
        }
    }
}

#[cfg(test)]
#[path = "spool_tests.rs"]
mod tests;
