// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::{new_alert, AlertType, CheckRow};
use chief_core::{Level, SourceType, TelemetryEvent};
use chrono::TimeZone;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn event_at(at: DateTime<Utc>) -> TelemetryEvent {
    TelemetryEvent::new(SourceType::Chief, "job.started", Level::Info, "x", at).with_job("etl")
}

#[tokio::test]
async fn prunes_only_events_older_than_retention() {
    let store = MonitorStore::in_memory().await.unwrap();
    store
        .insert_event(&event_at(base() - Duration::days(31)), base())
        .await
        .unwrap();
    store
        .insert_event(&event_at(base() - Duration::days(29)), base())
        .await
        .unwrap();

    let deleted = prune_events(&store, base(), 30).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count_events().await.unwrap(), 1);
}

#[tokio::test]
async fn alerts_and_checks_survive_retention() {
    let store = MonitorStore::in_memory().await.unwrap();
    store
        .insert_event(&event_at(base() - Duration::days(60)), base())
        .await
        .unwrap();
    store
        .upsert_check(&CheckRow::new("etl", base() - Duration::days(60)))
        .await
        .unwrap();
    store
        .open_alert(&new_alert(
            "etl",
            AlertType::Failure,
            Level::Error,
            "etl:FAILURE".to_string(),
            "Job etl failed".to_string(),
            serde_json::Map::new(),
            base() - Duration::days(60),
        ))
        .await
        .unwrap();

    prune_events(&store, base(), 30).await.unwrap();

    assert_eq!(store.count_events().await.unwrap(), 0);
    assert!(store.get_check("etl").await.unwrap().is_some());
    assert_eq!(store.list_alerts("etl").await.unwrap().len(), 1);
}
