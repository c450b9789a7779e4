// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded event, check, and alert store.
//!
//! SQLite behind a single-connection pool: ingest handlers and the
//! evaluator/retention timers all funnel through one writer. Alert dedupe
//! is enforced at the store level with a partial unique index on
//! `alerts(dedupe_key) WHERE status = 'OPEN'`, so opening an alert that is
//! already open is a no-op regardless of caller interleaving.

use chief_core::TelemetryEvent;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Health state derived from a job's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Up,
    Late,
    Down,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Up => "UP",
            CheckStatus::Late => "LATE",
            CheckStatus::Down => "DOWN",
        }
    }
}

impl FromStr for CheckStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "UP" => Ok(CheckStatus::Up),
            "LATE" => Ok(CheckStatus::Late),
            "DOWN" => Ok(CheckStatus::Down),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Failure,
    Missed,
    Recovery,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Failure => "FAILURE",
            AlertType::Missed => "MISSED",
            AlertType::Recovery => "RECOVERY",
        }
    }
}

impl FromStr for AlertType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "FAILURE" => Ok(AlertType::Failure),
            "MISSED" => Ok(AlertType::Missed),
            "RECOVERY" => Ok(AlertType::Recovery),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Open,
    Closed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "OPEN",
            AlertStatus::Closed => "CLOSED",
        }
    }
}

/// One per-job health record.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRow {
    pub job_name: String,
    pub enabled: bool,
    pub alert_on_failure: bool,
    pub alert_on_miss: bool,
    pub grace_seconds: i64,
    pub status: CheckStatus,
    pub expected_next_at: Option<DateTime<Utc>>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub consecutive_failures: i64,
    pub updated_at: DateTime<Utc>,
}

impl CheckRow {
    /// Fresh check for a job's first sighting.
    pub fn new(job_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            job_name: job_name.to_string(),
            enabled: true,
            alert_on_failure: true,
            alert_on_miss: true,
            grace_seconds: 120,
            status: CheckStatus::Up,
            expected_next_at: None,
            last_heartbeat_at: None,
            last_success_at: None,
            last_failure_at: None,
            consecutive_failures: 0,
            updated_at: now,
        }
    }
}

/// One alert row.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub job_name: String,
    pub alert_type: AlertType,
    pub severity: chief_core::Level,
    pub status: AlertStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub dedupe_key: String,
    pub title: String,
    pub details: Map<String, Value>,
}

#[derive(FromRow)]
struct CheckRecord {
    job_name: String,
    enabled: bool,
    alert_on_failure: bool,
    alert_on_miss: bool,
    grace_seconds: i64,
    status: String,
    expected_next_at: Option<DateTime<Utc>>,
    last_heartbeat_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    consecutive_failures: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CheckRecord> for CheckRow {
    type Error = StoreError;

    fn try_from(record: CheckRecord) -> Result<Self, StoreError> {
        let status = record
            .status
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("check status {:?}", record.status)))?;
        Ok(CheckRow {
            job_name: record.job_name,
            enabled: record.enabled,
            alert_on_failure: record.alert_on_failure,
            alert_on_miss: record.alert_on_miss,
            grace_seconds: record.grace_seconds,
            status,
            expected_next_at: record.expected_next_at,
            last_heartbeat_at: record.last_heartbeat_at,
            last_success_at: record.last_success_at,
            last_failure_at: record.last_failure_at,
            consecutive_failures: record.consecutive_failures,
            updated_at: record.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AlertRecord {
    id: String,
    job_name: String,
    alert_type: String,
    severity: String,
    status: String,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    dedupe_key: String,
    title: String,
    details_json: String,
}

impl TryFrom<AlertRecord> for Alert {
    type Error = StoreError;

    fn try_from(record: AlertRecord) -> Result<Self, StoreError> {
        let alert_type = record
            .alert_type
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("alert type {:?}", record.alert_type)))?;
        let severity = record
            .severity
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("severity {:?}", record.severity)))?;
        let status = match record.status.as_str() {
            "OPEN" => AlertStatus::Open,
            "CLOSED" => AlertStatus::Closed,
            other => return Err(StoreError::CorruptRow(format!("alert status {other:?}"))),
        };
        let details = serde_json::from_str::<Value>(&record.details_json)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        Ok(Alert {
            id: record.id,
            job_name: record.job_name,
            alert_type,
            severity,
            status,
            opened_at: record.opened_at,
            closed_at: record.closed_at,
            dedupe_key: record.dedupe_key,
            title: record.title,
            details,
        })
    }
}

#[derive(Clone)]
pub struct MonitorStore {
    pool: SqlitePool,
}

impl MonitorStore {
    /// Open (creating if needed) the database at `path` and bootstrap the
    /// schema. A single connection enforces the single-writer discipline.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{path}?mode=rwc")
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:").await
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_type TEXT NOT NULL,
                event_type TEXT NOT NULL,
                level TEXT NOT NULL,
                message TEXT NOT NULL,
                event_at TIMESTAMP NOT NULL,
                received_at TIMESTAMP NOT NULL,
                job_name TEXT,
                script_path TEXT,
                run_id TEXT,
                scheduled_for TIMESTAMP,
                success BOOLEAN,
                return_code INTEGER,
                duration_ms INTEGER,
                metadata_json TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_event_at ON events(event_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_job ON events(job_name, event_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checks (
                job_name TEXT PRIMARY KEY,
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                alert_on_failure BOOLEAN NOT NULL DEFAULT TRUE,
                alert_on_miss BOOLEAN NOT NULL DEFAULT TRUE,
                grace_seconds INTEGER NOT NULL DEFAULT 120,
                status TEXT NOT NULL DEFAULT 'UP',
                expected_next_at TIMESTAMP,
                last_heartbeat_at TIMESTAMP,
                last_success_at TIMESTAMP,
                last_failure_at TIMESTAMP,
                consecutive_failures INTEGER NOT NULL DEFAULT 0,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                job_name TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                status TEXT NOT NULL,
                opened_at TIMESTAMP NOT NULL,
                closed_at TIMESTAMP,
                dedupe_key TEXT NOT NULL,
                title TEXT NOT NULL,
                details_json TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_open_dedupe \
             ON alerts(dedupe_key) WHERE status = 'OPEN'",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alerts_job ON alerts(job_name, opened_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // -- events --

    pub async fn insert_event(
        &self,
        event: &TelemetryEvent,
        received_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let metadata_json = serde_json::to_string(&event.metadata)?;
        let result = sqlx::query(
            r#"
            INSERT INTO events (
                source_type, event_type, level, message, event_at, received_at,
                job_name, script_path, run_id, scheduled_for,
                success, return_code, duration_ms, metadata_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.source_type.as_str())
        .bind(&event.event_type)
        .bind(event.level.as_str())
        .bind(&event.message)
        .bind(event.event_at)
        .bind(received_at)
        .bind(&event.job_name)
        .bind(&event.script_path)
        .bind(&event.run_id)
        .bind(event.scheduled_for)
        .bind(event.success)
        .bind(event.return_code)
        .bind(event.duration_ms)
        .bind(metadata_json)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn count_events(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Read one event back by row id (round-trip checks in tests).
    pub async fn event_payload(&self, id: i64) -> Result<Option<Value>, StoreError> {
        #[derive(FromRow)]
        struct EventRecord {
            source_type: String,
            event_type: String,
            level: String,
            message: String,
            event_at: DateTime<Utc>,
            received_at: DateTime<Utc>,
            job_name: Option<String>,
            script_path: Option<String>,
            run_id: Option<String>,
            scheduled_for: Option<DateTime<Utc>>,
            success: Option<bool>,
            return_code: Option<i64>,
            duration_ms: Option<i64>,
            metadata_json: String,
        }

        let record = sqlx::query_as::<_, EventRecord>(
            "SELECT source_type, event_type, level, message, event_at, received_at, \
             job_name, script_path, run_id, scheduled_for, success, return_code, \
             duration_ms, metadata_json FROM events WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };
        let metadata: Value = serde_json::from_str(&record.metadata_json)?;
        let mut payload = serde_json::json!({
            "sourceType": record.source_type,
            "eventType": record.event_type,
            "level": record.level,
            "message": record.message,
            "eventAt": record.event_at,
            "receivedAt": record.received_at,
            "metadata": metadata,
        });
        let object = payload.as_object_mut().expect("literal object");
        if let Some(job_name) = record.job_name {
            object.insert("jobName".into(), Value::String(job_name));
        }
        if let Some(script_path) = record.script_path {
            object.insert("scriptPath".into(), Value::String(script_path));
        }
        if let Some(run_id) = record.run_id {
            object.insert("runId".into(), Value::String(run_id));
        }
        if let Some(scheduled_for) = record.scheduled_for {
            object.insert("scheduledFor".into(), serde_json::json!(scheduled_for));
        }
        if let Some(success) = record.success {
            object.insert("success".into(), Value::Bool(success));
        }
        if let Some(return_code) = record.return_code {
            object.insert("returnCode".into(), serde_json::json!(return_code));
        }
        if let Some(duration_ms) = record.duration_ms {
            object.insert("durationMs".into(), serde_json::json!(duration_ms));
        }
        Ok(Some(payload))
    }

    /// Delete events older than the cutoff. Checks and alerts are never
    /// pruned here.
    pub async fn delete_events_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE event_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // -- checks --

    pub async fn get_check(&self, job_name: &str) -> Result<Option<CheckRow>, StoreError> {
        let record = sqlx::query_as::<_, CheckRecord>(
            "SELECT job_name, enabled, alert_on_failure, alert_on_miss, grace_seconds, \
             status, expected_next_at, last_heartbeat_at, last_success_at, \
             last_failure_at, consecutive_failures, updated_at \
             FROM checks WHERE job_name = ?",
        )
        .bind(job_name)
        .fetch_optional(&self.pool)
        .await?;
        record.map(CheckRow::try_from).transpose()
    }

    pub async fn upsert_check(&self, check: &CheckRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO checks (
                job_name, enabled, alert_on_failure, alert_on_miss, grace_seconds,
                status, expected_next_at, last_heartbeat_at, last_success_at,
                last_failure_at, consecutive_failures, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(job_name) DO UPDATE SET
                enabled = excluded.enabled,
                alert_on_failure = excluded.alert_on_failure,
                alert_on_miss = excluded.alert_on_miss,
                grace_seconds = excluded.grace_seconds,
                status = excluded.status,
                expected_next_at = excluded.expected_next_at,
                last_heartbeat_at = excluded.last_heartbeat_at,
                last_success_at = excluded.last_success_at,
                last_failure_at = excluded.last_failure_at,
                consecutive_failures = excluded.consecutive_failures,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&check.job_name)
        .bind(check.enabled)
        .bind(check.alert_on_failure)
        .bind(check.alert_on_miss)
        .bind(check.grace_seconds)
        .bind(check.status.as_str())
        .bind(check.expected_next_at)
        .bind(check.last_heartbeat_at)
        .bind(check.last_success_at)
        .bind(check.last_failure_at)
        .bind(check.consecutive_failures)
        .bind(check.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_enabled_checks(&self) -> Result<Vec<CheckRow>, StoreError> {
        let records = sqlx::query_as::<_, CheckRecord>(
            "SELECT job_name, enabled, alert_on_failure, alert_on_miss, grace_seconds, \
             status, expected_next_at, last_heartbeat_at, last_success_at, \
             last_failure_at, consecutive_failures, updated_at \
             FROM checks WHERE enabled = TRUE ORDER BY job_name",
        )
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(CheckRow::try_from).collect()
    }

    // -- alerts --

    /// Open an alert unless one with the same dedupe key is already OPEN.
    /// Returns whether a row was inserted.
    pub async fn open_alert(&self, alert: &Alert) -> Result<bool, StoreError> {
        let details_json = serde_json::to_string(&alert.details)?;
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (
                id, job_name, alert_type, severity, status, opened_at,
                closed_at, dedupe_key, title, details_json
            ) VALUES (?, ?, ?, ?, 'OPEN', ?, NULL, ?, ?, ?)
            ON CONFLICT(dedupe_key) WHERE status = 'OPEN' DO NOTHING
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.job_name)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(alert.opened_at)
        .bind(&alert.dedupe_key)
        .bind(&alert.title)
        .bind(details_json)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn find_open_alert(
        &self,
        dedupe_key: &str,
    ) -> Result<Option<Alert>, StoreError> {
        let record = sqlx::query_as::<_, AlertRecord>(
            "SELECT id, job_name, alert_type, severity, status, opened_at, closed_at, \
             dedupe_key, title, details_json \
             FROM alerts WHERE dedupe_key = ? AND status = 'OPEN'",
        )
        .bind(dedupe_key)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Alert::try_from).transpose()
    }

    /// Close the OPEN alert with this dedupe key, if any. Returns whether a
    /// row transitioned.
    pub async fn close_alert(
        &self,
        dedupe_key: &str,
        closed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE alerts SET status = 'CLOSED', closed_at = ? \
             WHERE dedupe_key = ? AND status = 'OPEN'",
        )
        .bind(closed_at)
        .bind(dedupe_key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_alerts(&self, job_name: &str) -> Result<Vec<Alert>, StoreError> {
        let records = sqlx::query_as::<_, AlertRecord>(
            "SELECT id, job_name, alert_type, severity, status, opened_at, closed_at, \
             dedupe_key, title, details_json \
             FROM alerts WHERE job_name = ? ORDER BY opened_at, id",
        )
        .bind(job_name)
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(Alert::try_from).collect()
    }

    /// Auto-close OPEN RECOVERY alerts opened before the cutoff.
    pub async fn close_stale_recovery_alerts(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE alerts SET status = 'CLOSED', closed_at = ? \
             WHERE alert_type = 'RECOVERY' AND status = 'OPEN' AND opened_at < ?",
        )
        .bind(now)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Build a new alert value ready for [`MonitorStore::open_alert`].
pub fn new_alert(
    job_name: &str,
    alert_type: AlertType,
    severity: chief_core::Level,
    dedupe_key: String,
    title: String,
    details: Map<String, Value>,
    now: DateTime<Utc>,
) -> Alert {
    Alert {
        id: uuid::Uuid::new_v4().to_string(),
        job_name: job_name.to_string(),
        alert_type,
        severity,
        status: AlertStatus::Open,
        opened_at: now,
        closed_at: None,
        dedupe_key,
        title,
        details,
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
