// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequential script execution for one job run.
//!
//! Scripts run as subprocesses with captured output and a per-script
//! timeout. Outcomes are normalized (`-1` timeout, `-2` spawn failure,
//! otherwise the real exit code) and never surface as errors; failures
//! feed stop-on-failure logic and telemetry only.

use crate::emitter::TelemetryEmitter;
use crate::env::worker_env;
use chief_config::{JobRuntime, MonitorSettings, ScriptSpec};
use chief_core::{
    time_fmt, Clock, Level, RunId, SourceType, TelemetryEvent, EVENT_JOB_COMPLETED,
    EVENT_JOB_FAILED, EVENT_JOB_NEXT_SCHEDULED, EVENT_JOB_STARTED, EVENT_SCRIPT_COMPLETED,
    EVENT_SCRIPT_STARTED,
};
use chief_config::CheckSettings;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Exit code recorded when a script exceeds its timeout.
pub const RETURN_CODE_TIMEOUT: i64 = -1;
/// Exit code recorded when the subprocess could not be spawned.
pub const RETURN_CODE_SPAWN_FAILURE: i64 = -2;

/// Captured output is previewed in telemetry metadata up to this length.
const OUTPUT_PREVIEW_LIMIT: usize = 1000;

/// Outcome of one script execution.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    pub success: bool,
    pub return_code: i64,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
    /// `"timeout"` or `"spawn_failure"` for synthetic return codes.
    pub error: Option<&'static str>,
}

/// Outcome of one job run.
#[derive(Debug, Clone)]
pub struct JobRunResult {
    pub job_name: String,
    pub run_id: RunId,
    pub success: bool,
    pub scripts_executed: usize,
}

/// Run one script with the injected environment and its configured timeout.
///
/// The subprocess is killed when the timeout elapses (dropping the tokio
/// child on the abandoned future kills the process tree).
pub async fn run_script(
    script: &ScriptSpec,
    working_dir: &Path,
    env: &[(String, String)],
) -> ScriptOutcome {
    let started = std::time::Instant::now();
    let mut command = Command::new(&script.resolved_path);
    command
        .args(&script.args)
        .current_dir(working_dir)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            return ScriptOutcome {
                success: false,
                return_code: RETURN_CODE_SPAWN_FAILURE,
                duration: started.elapsed(),
                stdout: String::new(),
                stderr: err.to_string(),
                error: Some("spawn_failure"),
            }
        }
    };

    let timeout = Duration::from_secs(script.timeout_seconds);
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let return_code = exit_code(&output.status);
            ScriptOutcome {
                success: return_code == 0,
                return_code,
                duration: started.elapsed(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                error: None,
            }
        }
        Ok(Err(err)) => ScriptOutcome {
            success: false,
            return_code: RETURN_CODE_SPAWN_FAILURE,
            duration: started.elapsed(),
            stdout: String::new(),
            stderr: err.to_string(),
            error: Some("spawn_failure"),
        },
        Err(_elapsed) => ScriptOutcome {
            success: false,
            return_code: RETURN_CODE_TIMEOUT,
            duration: started.elapsed(),
            stdout: String::new(),
            stderr: format!("timed out after {} seconds", script.timeout_seconds),
            error: Some("timeout"),
        },
    }
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i64 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code as i64,
        None => -(status.signal().unwrap_or(1) as i64),
    }
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i64 {
    status.code().unwrap_or(RETURN_CODE_TIMEOUT) as i64
}

/// Run every script of a job in order, emitting lifecycle telemetry.
pub async fn run_job(
    runtime: &JobRuntime,
    scheduled_for: Option<DateTime<Utc>>,
    emitter: &TelemetryEmitter,
    monitor_settings: &MonitorSettings,
    clock: &dyn Clock,
) -> JobRunResult {
    let spec = &runtime.spec;
    let telemetry_on = spec.monitor.enabled;
    let started = clock.now();
    let run_id = RunId::mint(&spec.name, started);
    let check_meta = check_metadata(&spec.monitor.check);

    match scheduled_for {
        Some(at) => tracing::info!(
            run_id = %run_id,
            job = %spec.name,
            scheduled_for = %at.with_timezone(&runtime.compiled.tz).to_rfc3339(),
            "starting job"
        ),
        None => tracing::info!(run_id = %run_id, job = %spec.name, "starting job"),
    }

    emitter.emit_if(
        telemetry_on,
        TelemetryEvent::new(
            SourceType::Chief,
            EVENT_JOB_STARTED,
            Level::Info,
            format!("Job {} started.", spec.name),
            started,
        )
        .with_job(&spec.name)
        .with_run_id(run_id.as_str())
        .with_scheduled_for(scheduled_for)
        .with_metadata("overlap", json!(spec.overlap.as_str()))
        .with_metadata("script_count", json!(spec.scripts.len()))
        .with_meta_map(&check_meta),
    );

    let mut outcomes: Vec<(String, ScriptOutcome)> = Vec::new();
    for (idx, script) in spec.scripts.iter().enumerate() {
        let position = idx + 1;
        tracing::info!(
            run_id = %run_id,
            script = %script.path,
            "[{position}/{}] running script",
            spec.scripts.len()
        );

        emitter.emit_if(
            telemetry_on,
            TelemetryEvent::new(
                SourceType::Chief,
                EVENT_SCRIPT_STARTED,
                Level::Info,
                format!("Script started: {}", script.path),
                clock.now(),
            )
            .with_job(&spec.name)
            .with_script_path(script.resolved_path.display().to_string())
            .with_run_id(run_id.as_str())
            .with_scheduled_for(scheduled_for)
            .with_metadata("script_index", json!(position))
            .with_metadata("script_total", json!(spec.scripts.len()))
            .with_metadata("args", json!(script.args))
            .with_metadata("timeout_seconds", json!(script.timeout_seconds)),
        );

        let env = worker_env(
            spec,
            script,
            &run_id,
            scheduled_for,
            telemetry_on.then_some(monitor_settings),
        );
        let outcome = run_script(script, &spec.working_dir, &env).await;

        let mut completed = TelemetryEvent::new(
            SourceType::Chief,
            EVENT_SCRIPT_COMPLETED,
            if outcome.success { Level::Info } else { Level::Error },
            if outcome.success {
                format!("Script completed: {}", script.path)
            } else {
                format!("Script failed: {} (code={})", script.path, outcome.return_code)
            },
            clock.now(),
        )
        .with_job(&spec.name)
        .with_script_path(script.resolved_path.display().to_string())
        .with_run_id(run_id.as_str())
        .with_scheduled_for(scheduled_for)
        .with_metadata("error", json!(outcome.error))
        .with_metadata("stdout_preview", json!(preview(&outcome.stdout)))
        .with_metadata("stderr_preview", json!(preview(&outcome.stderr)));
        completed.success = Some(outcome.success);
        completed.return_code = Some(outcome.return_code);
        completed.duration_ms = Some(outcome.duration.as_millis() as i64);
        emitter.emit_if(telemetry_on, completed);

        if outcome.success {
            tracing::info!(
                run_id = %run_id,
                script = %script.path,
                duration_ms = outcome.duration.as_millis() as u64,
                "script succeeded"
            );
        } else {
            tracing::error!(
                run_id = %run_id,
                script = %script.path,
                code = outcome.return_code,
                "script failed"
            );
            if !outcome.stderr.trim().is_empty() {
                tracing::error!(run_id = %run_id, stderr = %outcome.stderr.trim(), "script stderr");
            }
        }

        let failed = !outcome.success;
        outcomes.push((script.path.clone(), outcome));
        if failed && spec.stop_on_failure {
            tracing::error!(run_id = %run_id, "stop_on_failure=true; aborting remaining scripts");
            break;
        }
    }

    let ended = clock.now();
    let success = outcomes.iter().all(|(_, outcome)| outcome.success);
    let failed_script = outcomes
        .iter()
        .find(|(_, outcome)| !outcome.success)
        .map(|(path, _)| path.clone());

    let mut finished = TelemetryEvent::new(
        SourceType::Chief,
        if success { EVENT_JOB_COMPLETED } else { EVENT_JOB_FAILED },
        if success { Level::Info } else { Level::Error },
        if success {
            format!("Job {} completed successfully.", spec.name)
        } else {
            format!("Job {} failed.", spec.name)
        },
        ended,
    )
    .with_job(&spec.name)
    .with_run_id(run_id.as_str())
    .with_scheduled_for(scheduled_for)
    .with_metadata("scripts_executed", json!(outcomes.len()))
    .with_metadata("scripts_total", json!(spec.scripts.len()))
    .with_metadata("stop_on_failure", json!(spec.stop_on_failure))
    .with_metadata("failed_script", json!(failed_script))
    .with_meta_map(&check_meta);
    finished.success = Some(success);
    finished.duration_ms = Some((ended - started).num_milliseconds());
    emitter.emit_if(telemetry_on, finished);

    tracing::info!(
        run_id = %run_id,
        job = %spec.name,
        success,
        duration_ms = (ended - started).num_milliseconds(),
        "job finished"
    );

    emit_next_scheduled(runtime, &run_id, scheduled_for, ended, emitter, &check_meta);

    JobRunResult {
        job_name: spec.name.clone(),
        run_id,
        success,
        scripts_executed: outcomes.len(),
    }
}

/// Announce the next firing so the monitor can arm its missed-run check.
fn emit_next_scheduled(
    runtime: &JobRuntime,
    run_id: &RunId,
    scheduled_for: Option<DateTime<Utc>>,
    after: DateTime<Utc>,
    emitter: &TelemetryEmitter,
    check_meta: &Map<String, Value>,
) {
    let spec = &runtime.spec;
    let next = runtime.compiled.next_run_after(after);
    let next_iso = next.map(time_fmt::to_utc_string);

    match &next_iso {
        Some(iso) => tracing::info!(run_id = %run_id, job = %spec.name, next_run = %iso, "next scheduled run"),
        None => tracing::info!(
            run_id = %run_id,
            job = %spec.name,
            "next scheduled run: none (outside bounds/exclusions or schedule ended)"
        ),
    }

    emitter.emit_if(
        spec.monitor.enabled,
        TelemetryEvent::new(
            SourceType::Chief,
            EVENT_JOB_NEXT_SCHEDULED,
            Level::Info,
            match &next_iso {
                Some(iso) => format!("Next run for {}: {}", spec.name, iso),
                None => format!("Next run for {}: none", spec.name),
            },
            after,
        )
        .with_job(&spec.name)
        .with_run_id(run_id.as_str())
        .with_scheduled_for(scheduled_for)
        .with_metadata("next_run_at", json!(next_iso))
        .with_meta_map(check_meta),
    );
}

/// Check settings as the metadata map the monitor's check engine consumes.
pub fn check_metadata(check: &CheckSettings) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("check_enabled".to_string(), json!(check.enabled));
    map.insert("grace_seconds".to_string(), json!(check.grace_seconds));
    map.insert("alert_on_failure".to_string(), json!(check.alert_on_failure));
    map.insert("alert_on_miss".to_string(), json!(check.alert_on_miss));
    map
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    trimmed.chars().take(OUTPUT_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
