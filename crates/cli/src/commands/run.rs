// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chief run` - execute jobs once, optionally gated on schedule.

use crate::{EXIT_FAILURE, EXIT_OK};
use anyhow::Result;
use chief_config::{compile_jobs, load_config, select_jobs};
use chief_core::SystemClock;
use chief_engine::{run_job, start_heartbeat, HeartbeatMode, TelemetryEmitter};
use chrono::Utc;
use clap::Args;
use std::path::Path;
use std::sync::Arc;

#[derive(Args)]
pub struct RunArgs {
    /// Run one job by name
    #[arg(long)]
    pub job: Option<String>,

    /// Only run selected job(s) if currently due
    #[arg(long)]
    pub respect_schedule: bool,
}

pub async fn handle(config_path: &Path, args: RunArgs) -> Result<i32> {
    let config = load_config(config_path)?;
    let runtimes = compile_jobs(&config.jobs)?;
    let selected = select_jobs(&runtimes, args.job.as_deref(), false)?;
    let monitor_settings = config.effective_monitor();

    let emitter = TelemetryEmitter::start(&monitor_settings);
    let clock = Arc::new(SystemClock);
    let heartbeat = start_heartbeat(
        emitter.clone(),
        monitor_settings.heartbeat_seconds,
        HeartbeatMode::Run,
        clock.clone(),
    );

    let mut exit_code = EXIT_OK;
    let now = Utc::now();
    for runtime in &selected {
        if args.respect_schedule && !runtime.compiled.is_due_at(now) {
            tracing::info!(job = %runtime.spec.name, "skipping: not due now");
            continue;
        }
        let result = run_job(runtime, None, &emitter, &monitor_settings, &SystemClock).await;
        if !result.success {
            exit_code = EXIT_FAILURE;
        }
    }

    heartbeat.stop();
    emitter.close().await;
    Ok(exit_code)
}
