// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire serialization tests for telemetry events.

use super::*;
use chrono::TimeZone;
use serde_json::json;

fn sample_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

#[test]
fn serializes_camel_case_and_omits_absent_fields() {
    let event = TelemetryEvent::new(
        SourceType::Chief,
        EVENT_JOB_STARTED,
        Level::Info,
        "Job etl started.",
        sample_at(),
    )
    .with_job("etl");

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["sourceType"], "chief");
    assert_eq!(value["eventType"], "job.started");
    assert_eq!(value["level"], "INFO");
    assert_eq!(value["jobName"], "etl");
    assert_eq!(value["eventAt"], "2026-03-14T09:26:53Z");
    let obj = value.as_object().unwrap();
    assert!(!obj.contains_key("returnCode"));
    assert!(!obj.contains_key("scheduledFor"));
    assert!(!obj.contains_key("success"));
}

#[test]
fn round_trips_outcome_fields() {
    let event = TelemetryEvent::new(
        SourceType::Chief,
        EVENT_SCRIPT_COMPLETED,
        Level::Error,
        "Script failed: extract.py (code=3)",
        sample_at(),
    )
    .with_job("etl")
    .with_script_path("/srv/etl/extract.py")
    .with_metadata("stderr_preview", json!("boom"));

    let mut event = event;
    event.success = Some(false);
    event.return_code = Some(3);
    event.duration_ms = Some(1523);

    let text = serde_json::to_string(&event).unwrap();
    let back: TelemetryEvent = serde_json::from_str(&text).unwrap();
    assert_eq!(back, event);
}

#[test]
fn deserializes_missing_metadata_as_empty_map() {
    let raw = json!({
        "sourceType": "worker",
        "eventType": "worker.message",
        "level": "WARN",
        "message": "low disk",
        "eventAt": "2026-03-14T09:26:53Z",
    });
    let event: TelemetryEvent = serde_json::from_value(raw).unwrap();
    assert!(event.metadata.is_empty());
    assert_eq!(event.source_type, SourceType::Worker);
}

#[test]
fn source_type_parse_is_case_insensitive() {
    assert_eq!("CHIEF".parse::<SourceType>(), Ok(SourceType::Chief));
    assert_eq!("Worker".parse::<SourceType>(), Ok(SourceType::Worker));
    assert!("gateway".parse::<SourceType>().is_err());
}

#[test]
fn level_parse_is_case_insensitive() {
    assert_eq!("warn".parse::<Level>(), Ok(Level::Warn));
    assert_eq!("Critical".parse::<Level>(), Ok(Level::Critical));
    assert!("TRACE".parse::<Level>().is_err());
}

#[test]
fn heartbeat_classification() {
    for event_type in [EVENT_JOB_STARTED, EVENT_JOB_COMPLETED, EVENT_JOB_FAILED] {
        let event = TelemetryEvent::new(
            SourceType::Chief,
            event_type,
            Level::Info,
            "x",
            sample_at(),
        );
        assert!(event.is_heartbeat(), "{event_type} should be a heartbeat");
    }
    let event = TelemetryEvent::new(
        SourceType::Chief,
        EVENT_JOB_NEXT_SCHEDULED,
        Level::Info,
        "x",
        sample_at(),
    );
    assert!(!event.is_heartbeat());
}
