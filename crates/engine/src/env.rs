// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment injected into worker subprocesses.
//!
//! Workers read these variables to correlate their own telemetry with the
//! run that spawned them. The monitor endpoint variables are only present
//! when telemetry is effectively enabled for the job.

use chief_config::{JobSpec, MonitorSettings, ScriptSpec};
use chief_core::{time_fmt, RunId};
use chrono::{DateTime, Utc};

pub const ENV_RUN_ID: &str = "CHIEF_RUN_ID";
pub const ENV_JOB_NAME: &str = "CHIEF_JOB_NAME";
pub const ENV_SCRIPT_PATH: &str = "CHIEF_SCRIPT_PATH";
pub const ENV_SCHEDULED_FOR: &str = "CHIEF_SCHEDULED_FOR";
pub const ENV_MONITOR_ENDPOINT: &str = "CHIEF_MONITOR_ENDPOINT";
pub const ENV_MONITOR_API_KEY: &str = "CHIEF_MONITOR_API_KEY";

/// Build the `CHIEF_*` environment for one script invocation.
pub fn worker_env(
    spec: &JobSpec,
    script: &ScriptSpec,
    run_id: &RunId,
    scheduled_for: Option<DateTime<Utc>>,
    monitor: Option<&MonitorSettings>,
) -> Vec<(String, String)> {
    let mut env = vec![
        (ENV_RUN_ID.to_string(), run_id.to_string()),
        (ENV_JOB_NAME.to_string(), spec.name.clone()),
        (
            ENV_SCRIPT_PATH.to_string(),
            script.resolved_path.display().to_string(),
        ),
    ];
    if let Some(scheduled_for) = scheduled_for {
        env.push((
            ENV_SCHEDULED_FOR.to_string(),
            time_fmt::to_utc_string(scheduled_for),
        ));
    }
    if let Some(monitor) = monitor.filter(|m| m.enabled) {
        env.push((ENV_MONITOR_ENDPOINT.to_string(), monitor.endpoint.clone()));
        if !monitor.api_key.is_empty() {
            env.push((ENV_MONITOR_API_KEY.to_string(), monitor.api_key.clone()));
        }
    }
    env
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
