// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon scheduler: trigger detection, overlap policies, dispatch.
//!
//! The pure state machine ([`DaemonState`]) is separated from the async
//! runner so dispatch decisions can be tested with an injected clock.
//!
//! Guarantees:
//! - triggers are detected in YAML declaration order (tie-break order);
//! - the trigger queue is scanned front-to-back each pass;
//! - at most one distinct job name is active at any instant (parallel
//!   clones of one job are allowed);
//! - no catch-up: at startup every `next_fire` is strictly in the future.

use crate::emitter::TelemetryEmitter;
use crate::executor::{check_metadata, run_job};
use chief_config::{JobRuntime, MonitorSettings, OverlapPolicy};
use chief_core::{
    Clock, Level, SourceType, TelemetryEvent, EVENT_DAEMON_DISPATCH,
    EVENT_DAEMON_OVERLAP_SKIPPED, EVENT_DAEMON_QUEUED_PENDING,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A concrete firing instant produced by a compiled schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub job_name: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Mutable per-job dispatch state.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    pub next_fire: Option<DateTime<Utc>>,
    pub running_count: u32,
    pub queued_pending: bool,
}

/// Message posted by a worker when a job run finishes.
#[derive(Debug, Clone)]
pub struct CompletionMsg {
    pub job_name: String,
    pub success: bool,
}

/// Outcome of one dispatch pass, in decision order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchNotice {
    /// Launch this trigger on a worker.
    Dispatch {
        job_name: String,
        scheduled_for: DateTime<Utc>,
        running_count: u32,
    },
    /// Trigger dropped because the job was still running (`skip`).
    OverlapSkipped {
        job_name: String,
        scheduled_for: DateTime<Utc>,
    },
    /// Trigger deferred to run after the current one (`queue`).
    QueuedPending {
        job_name: String,
        scheduled_for: DateTime<Utc>,
    },
}

/// The scheduler's shared state: job table, trigger queue, and the single
/// active-job pointer that enforces global serialization.
pub struct DaemonState {
    jobs: Vec<JobRuntime>,
    states: HashMap<String, JobState>,
    trigger_queue: VecDeque<TriggerEvent>,
    active_job: Option<String>,
}

impl DaemonState {
    /// Initialize with every `next_fire` strictly after `now` (no catch-up).
    pub fn new(jobs: Vec<JobRuntime>, now: DateTime<Utc>) -> Self {
        let states = jobs
            .iter()
            .map(|rt| {
                (
                    rt.spec.name.clone(),
                    JobState {
                        next_fire: rt.compiled.next_run_after(now),
                        ..JobState::default()
                    },
                )
            })
            .collect();
        Self {
            jobs,
            states,
            trigger_queue: VecDeque::new(),
            active_job: None,
        }
    }

    pub fn job(&self, name: &str) -> Option<&JobRuntime> {
        self.jobs.iter().find(|rt| rt.spec.name == name)
    }

    pub fn state(&self, name: &str) -> Option<&JobState> {
        self.states.get(name)
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    pub fn queued_triggers(&self) -> usize {
        self.trigger_queue.len()
    }

    /// True while any job is running or has work pending.
    pub fn has_inflight_work(&self) -> bool {
        self.states
            .values()
            .any(|s| s.running_count > 0 || s.queued_pending)
    }

    /// Apply a completion: decrement the running count, promote a queued
    /// pending run to the front of the trigger queue, and release the
    /// global serialization lock once the job is fully drained.
    pub fn on_completion(&mut self, job_name: &str, now: DateTime<Utc>) {
        let Some(state) = self.states.get_mut(job_name) else {
            return;
        };
        state.running_count = state.running_count.saturating_sub(1);

        if state.running_count == 0 && state.queued_pending {
            state.queued_pending = false;
            // Front of the queue: the deferred run goes before any trigger
            // that arrived while it waited.
            self.trigger_queue.push_front(TriggerEvent {
                job_name: job_name.to_string(),
                scheduled_for: now,
            });
            tracing::info!(job = job_name, "promoting queued pending run");
        }

        let state = &self.states[job_name];
        if self.active_job.as_deref() == Some(job_name)
            && state.running_count == 0
            && !state.queued_pending
        {
            self.active_job = None;
        }
    }

    /// Append triggers for every job whose `next_fire` has passed, in
    /// declaration order, advancing `next_fire` past each appended trigger.
    pub fn detect_triggers(&mut self, now: DateTime<Utc>) {
        for runtime in &self.jobs {
            let Some(state) = self.states.get_mut(&runtime.spec.name) else {
                continue;
            };
            while let Some(next_fire) = state.next_fire {
                if next_fire > now {
                    break;
                }
                self.trigger_queue.push_back(TriggerEvent {
                    job_name: runtime.spec.name.clone(),
                    scheduled_for: next_fire,
                });
                state.next_fire = runtime.compiled.next_run_after(next_fire);
            }
        }
    }

    /// Scan the trigger queue front-to-back, applying overlap policy and
    /// the global serialization precondition. Repeats until a full pass
    /// makes no progress.
    pub fn dispatch_pass(&mut self) -> Vec<DispatchNotice> {
        let mut notices = Vec::new();
        let mut made_progress = true;

        while made_progress {
            made_progress = false;
            for idx in 0..self.trigger_queue.len() {
                let trigger = self.trigger_queue[idx].clone();
                let Some(runtime) = self.jobs.iter().find(|rt| rt.spec.name == trigger.job_name)
                else {
                    self.trigger_queue.remove(idx);
                    made_progress = true;
                    break;
                };
                let overlap = runtime.spec.overlap;
                let state = &self.states[&trigger.job_name];

                if state.running_count > 0 {
                    match overlap {
                        OverlapPolicy::Skip => {
                            tracing::info!(
                                job = %trigger.job_name,
                                scheduled_for = %trigger.scheduled_for,
                                "skipping overlapping trigger"
                            );
                            notices.push(DispatchNotice::OverlapSkipped {
                                job_name: trigger.job_name.clone(),
                                scheduled_for: trigger.scheduled_for,
                            });
                            self.trigger_queue.remove(idx);
                            made_progress = true;
                            break;
                        }
                        OverlapPolicy::Queue => {
                            let state = self
                                .states
                                .get_mut(&trigger.job_name)
                                .expect("state exists");
                            if !state.queued_pending {
                                state.queued_pending = true;
                                tracing::info!(
                                    job = %trigger.job_name,
                                    "queueing one pending run"
                                );
                                notices.push(DispatchNotice::QueuedPending {
                                    job_name: trigger.job_name.clone(),
                                    scheduled_for: trigger.scheduled_for,
                                });
                            }
                            // Either queued or dropped; the trigger itself
                            // never stays in the queue.
                            self.trigger_queue.remove(idx);
                            made_progress = true;
                            break;
                        }
                        OverlapPolicy::Parallel => {
                            if self.active_job.is_none()
                                || self.active_job.as_deref() == Some(trigger.job_name.as_str())
                            {
                                notices.push(self.launch(&trigger));
                                self.trigger_queue.remove(idx);
                                made_progress = true;
                                break;
                            }
                            continue;
                        }
                    }
                }

                // Job idle: only the global serialization lock can block it.
                if self.active_job.is_some()
                    && self.active_job.as_deref() != Some(trigger.job_name.as_str())
                {
                    continue;
                }
                notices.push(self.launch(&trigger));
                self.trigger_queue.remove(idx);
                made_progress = true;
                break;
            }
        }
        notices
    }

    fn launch(&mut self, trigger: &TriggerEvent) -> DispatchNotice {
        self.active_job = Some(trigger.job_name.clone());
        let state = self
            .states
            .get_mut(&trigger.job_name)
            .expect("state exists");
        state.running_count += 1;
        DispatchNotice::Dispatch {
            job_name: trigger.job_name.clone(),
            scheduled_for: trigger.scheduled_for,
            running_count: state.running_count,
        }
    }
}

/// Run the daemon loop until `shutdown` resolves.
///
/// Returns `true` when the loop exited because of the shutdown signal. On
/// shutdown the loop stops polling, waits for in-flight runs (bounded by
/// the scripts' own timeouts), and leaves telemetry flushing to the caller.
pub async fn run_daemon(
    runtimes: Vec<JobRuntime>,
    monitor_settings: MonitorSettings,
    poll_seconds: u64,
    emitter: TelemetryEmitter,
    clock: Arc<dyn Clock>,
    shutdown: impl std::future::Future<Output = ()>,
) -> bool {
    let job_count = runtimes.len();
    let mut state = DaemonState::new(runtimes, clock.now());
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<CompletionMsg>();
    let poll = Duration::from_secs(poll_seconds.max(1));

    tracing::info!(jobs = job_count, poll_seconds, "daemon started");
    tokio::pin!(shutdown);

    loop {
        // Completion handling first so finished jobs release the lock
        // before triggers are considered.
        while let Ok(msg) = completion_rx.try_recv() {
            tracing::info!(job = %msg.job_name, success = msg.success, "job run finished");
            state.on_completion(&msg.job_name, clock.now());
        }

        state.detect_triggers(clock.now());

        for notice in state.dispatch_pass() {
            handle_notice(
                notice,
                &state,
                &monitor_settings,
                &emitter,
                &completion_tx,
                &clock,
            );
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("daemon interrupted; waiting for in-flight runs");
                drain_inflight(&mut state, &mut completion_rx, &clock).await;
                return true;
            }
            msg = completion_rx.recv() => {
                if let Some(msg) = msg {
                    tracing::info!(job = %msg.job_name, success = msg.success, "job run finished");
                    state.on_completion(&msg.job_name, clock.now());
                }
            }
            _ = tokio::time::sleep(poll) => {}
        }
    }
}

fn handle_notice(
    notice: DispatchNotice,
    state: &DaemonState,
    monitor_settings: &MonitorSettings,
    emitter: &TelemetryEmitter,
    completion_tx: &mpsc::UnboundedSender<CompletionMsg>,
    clock: &Arc<dyn Clock>,
) {
    match notice {
        DispatchNotice::Dispatch {
            job_name,
            scheduled_for,
            running_count,
        } => {
            let Some(runtime) = state.job(&job_name) else {
                return;
            };
            let telemetry_on = runtime.spec.monitor.enabled;
            tracing::info!(
                job = %job_name,
                overlap = runtime.spec.overlap.as_str(),
                running_count,
                "dispatching job"
            );
            emitter.emit_if(
                telemetry_on,
                TelemetryEvent::new(
                    SourceType::Chief,
                    EVENT_DAEMON_DISPATCH,
                    Level::Info,
                    format!("Dispatching {job_name}."),
                    clock.now(),
                )
                .with_job(&job_name)
                .with_scheduled_for(Some(scheduled_for))
                .with_metadata("overlap", json!(runtime.spec.overlap.as_str()))
                .with_metadata("running_count", json!(running_count))
                .with_meta_map(&check_metadata(&runtime.spec.monitor.check)),
            );

            let runtime = runtime.clone();
            let emitter = emitter.clone();
            let monitor_settings = monitor_settings.clone();
            let completion_tx = completion_tx.clone();
            let clock = Arc::clone(clock);
            tokio::spawn(async move {
                let result = run_job(
                    &runtime,
                    Some(scheduled_for),
                    &emitter,
                    &monitor_settings,
                    clock.as_ref(),
                )
                .await;
                let _ = completion_tx.send(CompletionMsg {
                    job_name: result.job_name,
                    success: result.success,
                });
            });
        }
        DispatchNotice::OverlapSkipped {
            job_name,
            scheduled_for,
        } => {
            let telemetry_on = state
                .job(&job_name)
                .is_some_and(|rt| rt.spec.monitor.enabled);
            emitter.emit_if(
                telemetry_on,
                TelemetryEvent::new(
                    SourceType::Chief,
                    EVENT_DAEMON_OVERLAP_SKIPPED,
                    Level::Info,
                    format!("Skipped overlapping trigger for {job_name}."),
                    clock.now(),
                )
                .with_job(&job_name)
                .with_scheduled_for(Some(scheduled_for))
                .with_metadata("overlap", json!("skip")),
            );
        }
        DispatchNotice::QueuedPending {
            job_name,
            scheduled_for,
        } => {
            let telemetry_on = state
                .job(&job_name)
                .is_some_and(|rt| rt.spec.monitor.enabled);
            emitter.emit_if(
                telemetry_on,
                TelemetryEvent::new(
                    SourceType::Chief,
                    EVENT_DAEMON_QUEUED_PENDING,
                    Level::Info,
                    format!("Queued overlapping trigger for {job_name}."),
                    clock.now(),
                )
                .with_job(&job_name)
                .with_scheduled_for(Some(scheduled_for))
                .with_metadata("overlap", json!("queue")),
            );
        }
    }
}

/// Wait for running jobs to finish after a shutdown request. Queued
/// pending runs are abandoned; only in-flight subprocesses are awaited.
async fn drain_inflight(
    state: &mut DaemonState,
    completion_rx: &mut mpsc::UnboundedReceiver<CompletionMsg>,
    clock: &Arc<dyn Clock>,
) {
    let any_running = |state: &DaemonState| {
        state
            .states
            .values()
            .any(|s| s.running_count > 0)
    };
    while any_running(state) {
        match completion_rx.recv().await {
            Some(msg) => {
                // Drop pending promotion on shutdown: do not restart work.
                if let Some(job_state) = state.states.get_mut(&msg.job_name) {
                    job_state.queued_pending = false;
                }
                state.on_completion(&msg.job_name, clock.now());
            }
            None => break,
        }
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
