// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chief_core::FakeClock;

#[test]
fn beat_carries_interval_mode_and_pid() {
    let clock = FakeClock::new();
    let event = beat(15, HeartbeatMode::Daemon, &clock);
    assert_eq!(event.event_type, "chief.heartbeat");
    assert_eq!(event.metadata["ping_interval_seconds"], 15);
    assert_eq!(event.metadata["mode"], "daemon");
    assert_eq!(
        event.metadata["pid"],
        serde_json::json!(std::process::id())
    );
    assert_eq!(event.event_at, clock.now());
}

#[test]
fn mode_strings() {
    assert_eq!(HeartbeatMode::Run.as_str(), "run");
    assert_eq!(HeartbeatMode::Daemon.as_str(), "daemon");
}

#[tokio::test]
async fn first_beat_fires_immediately() {
    // With a disabled emitter the ticker still runs; this exercises the
    // task lifecycle (immediate tick, clean abort).
    let clock = std::sync::Arc::new(FakeClock::new());
    let handle = start_heartbeat(TelemetryEmitter::disabled(), 15, HeartbeatMode::Run, clock);
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    handle.stop();
}
