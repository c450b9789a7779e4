// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Emitter pipeline tests with an injected batch sender.

use super::*;
use crate::test_helpers::monitor_settings;
use async_trait::async_trait;
use chief_core::{Level, SourceType, TelemetryEvent};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

/// Records every batch; configurable success.
struct RecordingSender {
    batches: Mutex<Vec<Vec<Value>>>,
    succeed: bool,
}

impl RecordingSender {
    fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(Vec::new()),
            succeed,
        })
    }

    fn total_events(&self) -> usize {
        self.batches.lock().iter().map(|b| b.len()).sum()
    }
}

#[async_trait]
impl BatchSender for RecordingSender {
    async fn send(&self, payloads: &[Value]) -> bool {
        self.batches.lock().push(payloads.to_vec());
        self.succeed
    }
}

fn event(message: &str) -> TelemetryEvent {
    TelemetryEvent::new(
        SourceType::Chief,
        "job.started",
        Level::Info,
        message,
        Utc::now(),
    )
    .with_job("etl")
}

#[tokio::test]
async fn flushes_buffered_events_in_batches() {
    let dir = TempDir::new().unwrap();
    let sender = RecordingSender::new(true);
    let emitter = TelemetryEmitter::start_with_sender(
        &monitor_settings(dir.path().join("spool.jsonl")),
        sender.clone(),
    );

    for i in 0..3 {
        emitter.emit(event(&format!("event {i}")));
    }
    emitter.close().await;

    assert_eq!(sender.total_events(), 3);
    assert!(!dir.path().join("spool.jsonl").exists());
}

#[tokio::test]
async fn failed_sends_spool_to_disk() {
    let dir = TempDir::new().unwrap();
    let spool_path = dir.path().join("spool.jsonl");
    let sender = RecordingSender::new(false);
    let emitter = TelemetryEmitter::start_with_sender(
        &monitor_settings(spool_path.clone()),
        sender.clone(),
    );

    emitter.emit(event("will fail"));
    emitter.emit(event("also fails"));
    emitter.close().await;

    let text = std::fs::read_to_string(&spool_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let parsed: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["jobName"], "etl");
}

#[tokio::test]
async fn spool_replays_when_sender_recovers() {
    let dir = TempDir::new().unwrap();
    let spool_path = dir.path().join("spool.jsonl");

    // First emitter fails every send, leaving events spooled.
    let failing = RecordingSender::new(false);
    let emitter = TelemetryEmitter::start_with_sender(
        &monitor_settings(spool_path.clone()),
        failing,
    );
    emitter.emit(event("stranded"));
    emitter.close().await;
    assert!(spool_path.exists());

    // Second emitter replays the spool on its flush tick.
    let recovering = RecordingSender::new(true);
    let emitter = TelemetryEmitter::start_with_sender(
        &monitor_settings(spool_path.clone()),
        recovering.clone(),
    );
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    emitter.close().await;

    assert_eq!(recovering.total_events(), 1);
    let text = std::fs::read_to_string(&spool_path).unwrap_or_default();
    assert!(text.trim().is_empty(), "spool should be drained: {text:?}");
}

#[tokio::test]
async fn spool_left_intact_while_sends_keep_failing() {
    let dir = TempDir::new().unwrap();
    let spool_path = dir.path().join("spool.jsonl");
    std::fs::write(
        &spool_path,
        "{\"sourceType\":\"chief\",\"eventType\":\"job.started\",\"level\":\"INFO\",\"message\":\"x\",\"eventAt\":\"2026-01-01T00:00:00Z\"}\n",
    )
    .unwrap();

    let sender = RecordingSender::new(false);
    let emitter = TelemetryEmitter::start_with_sender(
        &monitor_settings(spool_path.clone()),
        sender,
    );
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    emitter.close().await;

    let text = std::fs::read_to_string(&spool_path).unwrap();
    assert!(text.contains("job.started"), "spool must survive: {text:?}");
}

#[tokio::test]
async fn disabled_emitter_swallows_everything() {
    let emitter = TelemetryEmitter::disabled();
    assert!(!emitter.is_enabled());
    emitter.emit(event("ignored"));
    assert_eq!(emitter.dropped_count(), 0);
    emitter.close().await;
}

#[tokio::test]
async fn emit_after_close_drops_without_blocking() {
    let dir = TempDir::new().unwrap();
    let sender = RecordingSender::new(true);
    let emitter = TelemetryEmitter::start_with_sender(
        &monitor_settings(dir.path().join("spool.jsonl")),
        sender,
    );
    emitter.close().await;

    emitter.emit(event("late"));
    assert_eq!(emitter.dropped_count(), 1);
}
