// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chief daemon` - the scheduler loop.

use crate::{EXIT_INTERRUPTED, EXIT_OK};
use anyhow::Result;
use chief_config::{compile_jobs, load_config, select_jobs};
use chief_core::SystemClock;
use chief_engine::{run_daemon, start_heartbeat, HeartbeatMode, TelemetryEmitter};
use clap::Args;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_POLL_SECONDS: u64 = 10;

#[derive(Args)]
pub struct DaemonArgs {
    /// Polling interval in seconds
    #[arg(long, default_value_t = DEFAULT_POLL_SECONDS)]
    pub poll_seconds: u64,
}

pub async fn handle(config_path: &Path, args: DaemonArgs) -> Result<i32> {
    if args.poll_seconds < 1 {
        anyhow::bail!("--poll-seconds must be >= 1");
    }
    let config = load_config(config_path)?;
    let runtimes = compile_jobs(&config.jobs)?;
    let selected = select_jobs(&runtimes, None, false)?;
    let monitor_settings = config.effective_monitor();

    let emitter = TelemetryEmitter::start(&monitor_settings);
    let clock = Arc::new(SystemClock);
    let heartbeat = start_heartbeat(
        emitter.clone(),
        monitor_settings.heartbeat_seconds,
        HeartbeatMode::Daemon,
        clock.clone(),
    );

    let interrupted = run_daemon(
        selected,
        monitor_settings,
        args.poll_seconds,
        emitter.clone(),
        clock,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await;

    heartbeat.stop();
    emitter.close().await;
    Ok(if interrupted { EXIT_INTERRUPTED } else { EXIT_OK })
}
