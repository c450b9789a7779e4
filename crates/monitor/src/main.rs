// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! chief-monitor - telemetry ingest and alerting daemon.
//!
//! Runs the HTTP ingest surface plus two background timers: the evaluator
//! sweep (LATE/DOWN detection, missed-run alerts, recovery TTL) and the
//! retention sweeper.

use chief_monitor::{evaluator, ingest, retention, MonitorConfig, MonitorStore};
use chrono::Utc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = MonitorConfig::from_env();
    let store = MonitorStore::open(&config.db_path).await?;
    tracing::info!(db = %config.db_path, addr = %config.bind_addr(), "monitor starting");

    spawn_evaluator(store.clone(), &config);
    spawn_retention(store.clone(), &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let app = ingest::router(ingest::AppState::new(store, config));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("monitor shutting down");
        })
        .await?;
    Ok(())
}

fn spawn_evaluator(store: MonitorStore, config: &MonitorConfig) {
    let interval = Duration::from_secs(config.evaluator_interval_seconds.max(1));
    let recovery_ttl = config.recovery_ttl_seconds;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match evaluator::sweep(&store, Utc::now(), recovery_ttl).await {
                Ok(outcome) => {
                    if outcome.late > 0 || outcome.down > 0 || outcome.opened_missed > 0 {
                        tracing::info!(
                            late = outcome.late,
                            down = outcome.down,
                            opened_missed = outcome.opened_missed,
                            "evaluator sweep"
                        );
                    }
                }
                Err(err) => tracing::error!(error = %err, "evaluator sweep failed"),
            }
        }
    });
}

fn spawn_retention(store: MonitorStore, config: &MonitorConfig) {
    let interval = Duration::from_secs(config.retention_interval_seconds.max(1));
    let retention_days = config.retention_days;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = retention::prune_events(&store, Utc::now(), retention_days).await
            {
                tracing::error!(error = %err, "retention sweep failed");
            }
        }
    });
}
