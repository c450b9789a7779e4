// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock sweep deriving LATE/DOWN states and missed-run alerts.
//!
//! The sweep is the only place `MISSED` alerts open; `RECOVERY` alerts are
//! exclusive to the ingest path, except for the TTL auto-close of stale
//! recoveries handled here.

use crate::checks::missed_dedupe;
use crate::store::{new_alert, AlertType, CheckStatus, MonitorStore, StoreError};
use chief_core::Level;
use chrono::{DateTime, Duration, Utc};
use serde_json::Map;

/// Per-sweep observability counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Checks within their grace window this sweep.
    pub late: u64,
    /// Checks past their grace window this sweep.
    pub down: u64,
    /// MISSED alerts newly opened.
    pub opened_missed: u64,
    /// Stale RECOVERY alerts auto-closed.
    pub recovery_closed: u64,
}

/// Evaluate every enabled check against the clock.
pub async fn sweep(
    store: &MonitorStore,
    now: DateTime<Utc>,
    recovery_ttl_seconds: i64,
) -> Result<SweepOutcome, StoreError> {
    let mut outcome = SweepOutcome::default();

    for mut check in store.list_enabled_checks().await? {
        let Some(expected) = check.expected_next_at else {
            continue;
        };
        let diff = (now - expected).num_seconds();

        if diff > check.grace_seconds {
            outcome.down += 1;
            if check.status != CheckStatus::Down {
                check.status = CheckStatus::Down;
                check.updated_at = now;
                store.upsert_check(&check).await?;
                tracing::warn!(job = %check.job_name, late_by = diff, "check is DOWN");
            }
            if check.alert_on_miss {
                let opened = store
                    .open_alert(&new_alert(
                        &check.job_name,
                        AlertType::Missed,
                        Level::Warn,
                        missed_dedupe(&check.job_name),
                        format!("Job {} missed its scheduled run", check.job_name),
                        Map::new(),
                        now,
                    ))
                    .await?;
                if opened {
                    outcome.opened_missed += 1;
                }
            }
        } else if diff > 0 {
            outcome.late += 1;
            if check.status != CheckStatus::Late {
                check.status = CheckStatus::Late;
                check.updated_at = now;
                store.upsert_check(&check).await?;
                tracing::info!(job = %check.job_name, late_by = diff, "check is LATE");
            }
        } else if check.status != CheckStatus::Up {
            // Back within schedule; the evaluator never opens RECOVERY.
            check.status = CheckStatus::Up;
            check.updated_at = now;
            store.upsert_check(&check).await?;
        }
    }

    let cutoff = now - Duration::seconds(recovery_ttl_seconds.max(0));
    outcome.recovery_closed = store.close_stale_recovery_alerts(cutoff, now).await?;

    Ok(outcome)
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
