// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier minting.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one job invocation.
///
/// Format: `{job}:{YYYYMMDDHHMMSS}-{microseconds}-{pid}`. The microsecond
/// component makes the id unique per invocation within a process; the pid
/// disambiguates across restarts inside the same second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn mint(job_name: &str, started_at: DateTime<Utc>) -> Self {
        let micros = started_at.nanosecond() / 1_000;
        Self(format!(
            "{}:{}-{:06}-{}",
            job_name,
            started_at.format("%Y%m%d%H%M%S"),
            micros,
            std::process::id(),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
#[path = "run_id_tests.rs"]
mod tests;
