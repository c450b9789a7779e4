// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-facing telemetry client.
//!
//! Worker scripts inherit `CHIEF_*` correlation variables from the
//! orchestrator and post `worker.message` events straight to the monitor.
//! Posting is best-effort: when no endpoint is configured the client is
//! silently disabled, and every failure returns `false` rather than an
//! error.

use chief_core::{time_fmt, Level, SourceType, TelemetryEvent, EVENT_WORKER_MESSAGE};
use chrono::Utc;
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 400;

/// Correlation context read from the injected environment.
#[derive(Debug, Clone, Default)]
pub struct MonitorContext {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub run_id: Option<String>,
    pub job_name: Option<String>,
    pub script_path: Option<String>,
    pub scheduled_for: Option<String>,
}

impl MonitorContext {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_non_empty("CHIEF_MONITOR_ENDPOINT"),
            api_key: env_non_empty("CHIEF_MONITOR_API_KEY"),
            run_id: env_non_empty("CHIEF_RUN_ID"),
            job_name: env_non_empty("CHIEF_JOB_NAME"),
            script_path: env_non_empty("CHIEF_SCRIPT_PATH"),
            scheduled_for: env_non_empty("CHIEF_SCHEDULED_FOR"),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct MonitorClient {
    context: MonitorContext,
    client: reqwest::Client,
}

impl MonitorClient {
    /// Client configured from the injected environment.
    pub fn from_env() -> Self {
        Self::new(MonitorContext::from_env(), DEFAULT_TIMEOUT_MS)
    }

    pub fn new(context: MonitorContext, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(100)))
            .build()
            .unwrap_or_default();
        Self { context, client }
    }

    /// False when no monitor endpoint is configured; every post is a no-op.
    pub fn enabled(&self) -> bool {
        self.context.endpoint.is_some()
    }

    pub async fn debug(&self, message: &str, metadata: Map<String, Value>) -> bool {
        self.post(Level::Debug, message, metadata).await
    }

    pub async fn info(&self, message: &str, metadata: Map<String, Value>) -> bool {
        self.post(Level::Info, message, metadata).await
    }

    pub async fn warn(&self, message: &str, metadata: Map<String, Value>) -> bool {
        self.post(Level::Warn, message, metadata).await
    }

    pub async fn error(&self, message: &str, metadata: Map<String, Value>) -> bool {
        self.post(Level::Error, message, metadata).await
    }

    pub async fn critical(&self, message: &str, metadata: Map<String, Value>) -> bool {
        self.post(Level::Critical, message, metadata).await
    }

    async fn post(&self, level: Level, message: &str, metadata: Map<String, Value>) -> bool {
        let Some(endpoint) = self.context.endpoint.as_deref() else {
            return false;
        };
        let Some(event) = build_event(&self.context, level, message, metadata) else {
            return false;
        };

        let url = format!("{}/v1/events", endpoint.trim_end_matches('/'));
        let mut request = self.client.post(url).json(&event);
        if let Some(api_key) = self.context.api_key.as_deref() {
            request = request.header("x-api-key", api_key);
        }
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "worker telemetry post failed");
                false
            }
        }
    }
}

/// Build the `worker.message` event, or `None` for a blank message.
pub fn build_event(
    context: &MonitorContext,
    level: Level,
    message: &str,
    metadata: Map<String, Value>,
) -> Option<TelemetryEvent> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    let mut event = TelemetryEvent::new(
        SourceType::Worker,
        EVENT_WORKER_MESSAGE,
        level,
        message,
        Utc::now(),
    );
    event.metadata = metadata;
    event.job_name = context.job_name.clone();
    event.script_path = context.script_path.clone();
    event.run_id = context.run_id.clone();
    event.scheduled_for = context
        .scheduled_for
        .as_deref()
        .and_then(time_fmt::parse_utc);
    Some(event)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
