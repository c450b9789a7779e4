// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Check engine tests: heartbeat handling, failure/recovery lifecycle.

use super::*;
use crate::store::{AlertStatus, MonitorStore};
use chief_core::{Level, SourceType, TelemetryEvent};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn event(event_type: &str) -> TelemetryEvent {
    TelemetryEvent::new(
        SourceType::Chief,
        event_type,
        Level::Info,
        "x",
        now(),
    )
    .with_job("etl")
}

fn completed(success: bool) -> TelemetryEvent {
    let mut ev = event("job.completed");
    ev.success = Some(success);
    ev
}

#[tokio::test]
async fn first_sight_creates_check_with_defaults() {
    let store = MonitorStore::in_memory().await.unwrap();
    apply_event(&store, &event("job.started"), now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.status, CheckStatus::Up);
    assert!(check.enabled);
    assert_eq!(check.grace_seconds, 120);
    assert_eq!(check.last_heartbeat_at, Some(now()));
    assert_eq!(check.consecutive_failures, 0);
}

#[tokio::test]
async fn metadata_refreshes_check_config() {
    let store = MonitorStore::in_memory().await.unwrap();
    let mut ev = event("job.started");
    ev.metadata = json!({
        "check_enabled": false,
        "grace_seconds": 300,
        "alert_on_failure": false,
        "alert_on_miss": false,
    })
    .as_object()
    .cloned()
    .unwrap();
    apply_event(&store, &ev, now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert!(!check.enabled);
    assert_eq!(check.grace_seconds, 300);
    assert!(!check.alert_on_failure);
    assert!(!check.alert_on_miss);
}

#[tokio::test]
async fn next_scheduled_sets_expected_next_at() {
    let store = MonitorStore::in_memory().await.unwrap();
    let mut ev = event("job.next_scheduled");
    ev.metadata.insert(
        "next_run_at".to_string(),
        json!("2026-03-14T10:00:00.000Z"),
    );
    apply_event(&store, &ev, now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(
        check.expected_next_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap())
    );

    // A null next_run_at clears the expectation.
    let mut ev = event("job.next_scheduled");
    ev.metadata.insert("next_run_at".to_string(), json!(null));
    apply_event(&store, &ev, now()).await.unwrap();
    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.expected_next_at, None);
}

#[tokio::test]
async fn failure_then_recovery_lifecycle() {
    let store = MonitorStore::in_memory().await.unwrap();

    // job.started, then a failed completion, then a successful one.
    apply_event(&store, &event("job.started"), now()).await.unwrap();
    apply_event(&store, &completed(false), now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.consecutive_failures, 1);
    assert_eq!(check.last_failure_at, Some(now()));
    assert_eq!(check.status, CheckStatus::Up); // heartbeat keeps it UP
    let failure = store.find_open_alert("etl:FAILURE").await.unwrap();
    assert!(failure.is_some());

    apply_event(&store, &completed(true), now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.consecutive_failures, 0);
    assert_eq!(check.status, CheckStatus::Up);
    assert_eq!(check.last_success_at, Some(now()));

    let alerts = store.list_alerts("etl").await.unwrap();
    let failure = alerts
        .iter()
        .find(|a| a.alert_type == AlertType::Failure)
        .unwrap();
    assert_eq!(failure.status, AlertStatus::Closed);
    let recovery = alerts
        .iter()
        .find(|a| a.alert_type == AlertType::Recovery)
        .unwrap();
    assert_eq!(recovery.status, AlertStatus::Open);
    assert_eq!(recovery.dedupe_key, "etl:RECOVERY:FAILURE");
}

#[tokio::test]
async fn job_failed_event_counts_as_failure() {
    let store = MonitorStore::in_memory().await.unwrap();
    apply_event(&store, &event("job.failed"), now()).await.unwrap();
    apply_event(&store, &event("job.failed"), now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.consecutive_failures, 2);
    // Dedupe: two failures, one OPEN alert.
    let alerts = store.list_alerts("etl").await.unwrap();
    assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn heartbeat_closes_missed_and_opens_recovery() {
    let store = MonitorStore::in_memory().await.unwrap();
    store
        .open_alert(&crate::store::new_alert(
            "etl",
            AlertType::Missed,
            Level::Warn,
            missed_dedupe("etl"),
            "Job etl missed its scheduled run".to_string(),
            serde_json::Map::new(),
            now(),
        ))
        .await
        .unwrap();

    apply_event(&store, &event("job.started"), now()).await.unwrap();

    assert!(store.find_open_alert("etl:MISSED").await.unwrap().is_none());
    let recovery = store
        .find_open_alert("etl:RECOVERY:MISSED")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recovery.alert_type, AlertType::Recovery);
    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.status, CheckStatus::Up);
}

#[tokio::test]
async fn alert_on_miss_false_suppresses_recovery() {
    let store = MonitorStore::in_memory().await.unwrap();
    store
        .open_alert(&crate::store::new_alert(
            "etl",
            AlertType::Missed,
            Level::Warn,
            missed_dedupe("etl"),
            "Job etl missed its scheduled run".to_string(),
            serde_json::Map::new(),
            now(),
        ))
        .await
        .unwrap();

    let mut ev = event("job.started");
    ev.metadata.insert("alert_on_miss".to_string(), json!(false));
    apply_event(&store, &ev, now()).await.unwrap();

    // MISSED still closes, but no RECOVERY opens.
    assert!(store.find_open_alert("etl:MISSED").await.unwrap().is_none());
    assert!(store
        .find_open_alert("etl:RECOVERY:MISSED")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn alert_on_failure_false_suppresses_failure_alert() {
    let store = MonitorStore::in_memory().await.unwrap();
    let mut ev = completed(false);
    ev.metadata.insert("alert_on_failure".to_string(), json!(false));
    apply_event(&store, &ev, now()).await.unwrap();

    let check = store.get_check("etl").await.unwrap().unwrap();
    assert_eq!(check.consecutive_failures, 1);
    assert!(store.find_open_alert("etl:FAILURE").await.unwrap().is_none());
}

#[tokio::test]
async fn events_without_job_name_are_ignored() {
    let store = MonitorStore::in_memory().await.unwrap();
    let mut ev = event("job.started");
    ev.job_name = None;
    apply_event(&store, &ev, now()).await.unwrap();
    assert!(store.get_check("etl").await.unwrap().is_none());
}
