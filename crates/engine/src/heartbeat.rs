// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator liveness ticker.
//!
//! Emits `chief.heartbeat` immediately on start and then at a fixed
//! interval until stopped.

use crate::emitter::TelemetryEmitter;
use chief_core::{Clock, Level, SourceType, TelemetryEvent, EVENT_CHIEF_HEARTBEAT};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Which command is heartbeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatMode {
    Run,
    Daemon,
}

impl HeartbeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeartbeatMode::Run => "run",
            HeartbeatMode::Daemon => "daemon",
        }
    }
}

pub struct HeartbeatHandle {
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Start the ticker. The first beat fires immediately.
pub fn start_heartbeat(
    emitter: TelemetryEmitter,
    interval_seconds: u64,
    mode: HeartbeatMode,
    clock: Arc<dyn Clock>,
) -> HeartbeatHandle {
    let task = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        loop {
            interval.tick().await;
            emitter.emit(beat(interval_seconds, mode, clock.as_ref()));
        }
    });
    HeartbeatHandle { task }
}

/// Build one heartbeat event.
pub fn beat(interval_seconds: u64, mode: HeartbeatMode, clock: &dyn Clock) -> TelemetryEvent {
    TelemetryEvent::new(
        SourceType::Chief,
        EVENT_CHIEF_HEARTBEAT,
        Level::Info,
        "chief heartbeat",
        clock.now(),
    )
    .with_metadata("ping_interval_seconds", json!(interval_seconds))
    .with_metadata("mode", json!(mode.as_str()))
    .with_metadata("pid", json!(std::process::id()))
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
