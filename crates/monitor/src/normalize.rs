// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest normalization: unstructured JSON payloads into wire records.
//!
//! Events arrive as free-form maps. Required fields outside their
//! enumerations drop the event; everything else is coerced: enum case is
//! normalized, `eventAt` defaults to now, numerics are truncated to
//! integers, and a non-object `metadata` becomes `{}`. Unrecognized
//! metadata keys are retained verbatim.

use chief_core::{time_fmt, Level, SourceType, TelemetryEvent};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Project a raw payload into a [`TelemetryEvent`], or `None` when a
/// required field is missing or outside its enumeration.
pub fn normalize_event(raw: &Value, now: DateTime<Utc>) -> Option<TelemetryEvent> {
    let object = raw.as_object()?;

    let source_type: SourceType = non_empty_str(object.get("sourceType"))?.parse().ok()?;
    let level: Level = non_empty_str(object.get("level"))?.parse().ok()?;
    let event_type = non_empty_str(object.get("eventType"))?.to_string();
    let message = object.get("message")?.as_str()?.to_string();

    let event_at = object
        .get("eventAt")
        .and_then(Value::as_str)
        .and_then(time_fmt::parse_utc)
        .unwrap_or(now);

    let metadata = object
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);

    Some(TelemetryEvent {
        source_type,
        event_type,
        level,
        message,
        event_at,
        job_name: opt_string(object.get("jobName")),
        script_path: opt_string(object.get("scriptPath")),
        run_id: opt_string(object.get("runId")),
        scheduled_for: object
            .get("scheduledFor")
            .and_then(Value::as_str)
            .and_then(time_fmt::parse_utc),
        success: object.get("success").and_then(Value::as_bool),
        return_code: truncate_int(object.get("returnCode")),
        duration_ms: truncate_int(object.get("durationMs")),
        metadata,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn opt_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Numeric fields are truncated toward zero; anything non-numeric becomes
/// null.
fn truncate_int(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    value.as_f64().map(|f| f.trunc() as i64)
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
