// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry event wire types.
//!
//! Events travel as camelCase JSON objects. Optional fields are omitted
//! entirely rather than serialized as `null`, matching what the monitor
//! ingest expects from any emitter implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Lifecycle events emitted by the orchestrator.
pub const EVENT_JOB_STARTED: &str = "job.started";
pub const EVENT_JOB_COMPLETED: &str = "job.completed";
pub const EVENT_JOB_FAILED: &str = "job.failed";
pub const EVENT_JOB_NEXT_SCHEDULED: &str = "job.next_scheduled";
pub const EVENT_SCRIPT_STARTED: &str = "script.started";
pub const EVENT_SCRIPT_COMPLETED: &str = "script.completed";
pub const EVENT_DAEMON_DISPATCH: &str = "daemon.dispatch";
pub const EVENT_DAEMON_OVERLAP_SKIPPED: &str = "daemon.overlap_skipped";
pub const EVENT_DAEMON_QUEUED_PENDING: &str = "daemon.queued_pending";
pub const EVENT_CHIEF_HEARTBEAT: &str = "chief.heartbeat";

/// Event type used by worker scripts posting through the client crate.
pub const EVENT_WORKER_MESSAGE: &str = "worker.message";

/// Who produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Chief,
    Worker,
    Monitor,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Chief => "chief",
            SourceType::Worker => "worker",
            SourceType::Monitor => "monitor",
        }
    }
}

impl FromStr for SourceType {
    type Err = ();

    /// Case-insensitive parse; the wire normalizes to lowercase.
    fn from_str(s: &str) -> Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "chief" => Ok(SourceType::Chief),
            "worker" => Ok(SourceType::Worker),
            "monitor" => Ok(SourceType::Monitor),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Level {
    type Err = ();

    /// Case-insensitive parse; the wire normalizes to uppercase.
    fn from_str(s: &str) -> Result<Self, ()> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One telemetry record on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub source_type: SourceType,
    pub event_type: String,
    pub level: Level,
    pub message: String,
    pub event_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl TelemetryEvent {
    /// Build a minimal event; callers fill in correlation fields.
    pub fn new(
        source_type: SourceType,
        event_type: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        event_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_type,
            event_type: event_type.into(),
            level,
            message: message.into(),
            event_at,
            job_name: None,
            script_path: None,
            run_id: None,
            scheduled_for: None,
            success: None,
            return_code: None,
            duration_ms: None,
            metadata: Map::new(),
        }
    }

    pub fn with_job(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = Some(job_name.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_scheduled_for(mut self, scheduled_for: Option<DateTime<Utc>>) -> Self {
        self.scheduled_for = scheduled_for;
        self
    }

    pub fn with_script_path(mut self, script_path: impl Into<String>) -> Self {
        self.script_path = Some(script_path.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Merge a prebuilt metadata map (e.g. per-job check settings).
    pub fn with_meta_map(mut self, map: &Map<String, Value>) -> Self {
        self.metadata
            .extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// True for the event types the monitor treats as proof the job executed.
    pub fn is_heartbeat(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            EVENT_JOB_STARTED | EVENT_JOB_COMPLETED | EVENT_JOB_FAILED
        )
    }
}

/// Envelope for `POST /v1/events/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<TelemetryEvent>,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
