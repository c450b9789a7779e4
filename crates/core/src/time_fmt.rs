// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting and parsing helpers.
//!
//! All wire timestamps are ISO-8601 UTC with a trailing `Z`. Parsing is
//! lenient about offsets (any RFC 3339 offset is accepted and converted).

use chrono::{DateTime, SecondsFormat, Utc};

/// Format an instant as ISO-8601 UTC with millisecond precision.
pub fn to_utc_string(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 timestamp, converting any offset to UTC.
///
/// Returns `None` for naive timestamps or unparseable input; wire timestamps
/// are required to carry an offset.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
