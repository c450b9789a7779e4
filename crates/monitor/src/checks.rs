// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Check engine: applies accepted events to per-job health state and
//! drives the alert lifecycle.
//!
//! Alert classes and dedupe keys:
//! - `{job}:FAILURE` — opened on a failed run, closed by the next success;
//! - `{job}:MISSED` — opened by the evaluator, closed by any heartbeat;
//! - `{job}:RECOVERY:FAILURE` / `{job}:RECOVERY:MISSED` — opened when the
//!   corresponding alert transitions OPEN to CLOSED.

use crate::store::{new_alert, AlertType, CheckRow, CheckStatus, MonitorStore, StoreError};
use chief_core::{Level, TelemetryEvent, EVENT_JOB_COMPLETED, EVENT_JOB_NEXT_SCHEDULED};
use chief_core::time_fmt;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub fn failure_dedupe(job_name: &str) -> String {
    format!("{job_name}:FAILURE")
}

pub fn missed_dedupe(job_name: &str) -> String {
    format!("{job_name}:MISSED")
}

pub fn recovery_dedupe(job_name: &str, from: AlertType) -> String {
    format!("{job_name}:RECOVERY:{}", from.as_str())
}

/// Apply one accepted event to its job's check state. Events without a
/// job name are stored but never touch checks.
pub async fn apply_event(
    store: &MonitorStore,
    event: &TelemetryEvent,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let Some(job_name) = event.job_name.as_deref() else {
        return Ok(());
    };

    // First sight creates the row; every event refreshes config fields
    // from metadata.
    let mut check = store
        .get_check(job_name)
        .await?
        .unwrap_or_else(|| CheckRow::new(job_name, now));
    refresh_config(&mut check, &event.metadata);

    if event.event_type == EVENT_JOB_NEXT_SCHEDULED {
        check.expected_next_at = event
            .metadata
            .get("next_run_at")
            .and_then(Value::as_str)
            .and_then(time_fmt::parse_utc);
    }

    if event.is_heartbeat() {
        check.last_heartbeat_at = Some(event.event_at);
        check.status = CheckStatus::Up;

        // Evidence of life closes any missed-run alert.
        if store.close_alert(&missed_dedupe(job_name), now).await? && check.alert_on_miss {
            open_recovery(store, job_name, AlertType::Missed, now).await?;
        }
    }

    let failed = event.event_type == chief_core::EVENT_JOB_FAILED
        || (event.event_type == EVENT_JOB_COMPLETED && event.success == Some(false));
    let succeeded = event.event_type == EVENT_JOB_COMPLETED && event.success == Some(true);

    if failed {
        check.consecutive_failures += 1;
        check.last_failure_at = Some(event.event_at);
        if check.alert_on_failure {
            let mut details = Map::new();
            details.insert("runId".to_string(), Value::from(event.run_id.clone()));
            if let Some(code) = event.return_code {
                details.insert("returnCode".to_string(), Value::from(code));
            }
            let opened = store
                .open_alert(&new_alert(
                    job_name,
                    AlertType::Failure,
                    Level::Error,
                    failure_dedupe(job_name),
                    format!("Job {job_name} failed"),
                    details,
                    now,
                ))
                .await?;
            if opened {
                tracing::info!(job = job_name, "opened FAILURE alert");
            }
        }
    } else if succeeded {
        check.last_success_at = Some(event.event_at);
        check.consecutive_failures = 0;
        if check.alert_on_failure && store.close_alert(&failure_dedupe(job_name), now).await? {
            open_recovery(store, job_name, AlertType::Failure, now).await?;
        }
    }

    check.updated_at = now;
    store.upsert_check(&check).await?;
    Ok(())
}

async fn open_recovery(
    store: &MonitorStore,
    job_name: &str,
    from: AlertType,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let mut details = Map::new();
    details.insert(
        "recoveredFrom".to_string(),
        Value::from(from.as_str()),
    );
    store
        .open_alert(&new_alert(
            job_name,
            AlertType::Recovery,
            Level::Info,
            recovery_dedupe(job_name, from),
            format!("Job {job_name} recovered"),
            details,
            now,
        ))
        .await?;
    tracing::info!(job = job_name, from = from.as_str(), "opened RECOVERY alert");
    Ok(())
}

/// Refresh check configuration from event metadata, keeping current values
/// where the metadata is silent.
fn refresh_config(check: &mut CheckRow, metadata: &Map<String, Value>) {
    if let Some(enabled) = metadata.get("check_enabled").and_then(Value::as_bool) {
        check.enabled = enabled;
    }
    if let Some(grace) = metadata.get("grace_seconds").and_then(Value::as_i64) {
        check.grace_seconds = grace.max(0);
    }
    if let Some(flag) = metadata.get("alert_on_failure").and_then(Value::as_bool) {
        check.alert_on_failure = flag;
    }
    if let Some(flag) = metadata.get("alert_on_miss").and_then(Value::as_bool) {
        check.alert_on_miss = flag;
    }
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;
