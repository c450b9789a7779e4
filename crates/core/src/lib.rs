// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core wire types shared by the chief orchestrator and monitor.

pub mod clock;
pub mod event;
pub mod run_id;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{
    EventBatch, Level, SourceType, TelemetryEvent, EVENT_CHIEF_HEARTBEAT, EVENT_DAEMON_DISPATCH,
    EVENT_DAEMON_OVERLAP_SKIPPED, EVENT_DAEMON_QUEUED_PENDING, EVENT_JOB_COMPLETED,
    EVENT_JOB_FAILED, EVENT_JOB_NEXT_SCHEDULED, EVENT_JOB_STARTED, EVENT_SCRIPT_COMPLETED,
    EVENT_SCRIPT_STARTED, EVENT_WORKER_MESSAGE,
};
pub use run_id::RunId;
