// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event retention pruning. Alerts and check rows are kept forever.

use crate::store::{MonitorStore, StoreError};
use chrono::{DateTime, Duration, Utc};

/// Delete events older than `retention_days`. Returns the pruned count.
pub async fn prune_events(
    store: &MonitorStore,
    now: DateTime<Utc>,
    retention_days: i64,
) -> Result<u64, StoreError> {
    let cutoff = now - Duration::days(retention_days.max(0));
    let deleted = store.delete_events_before(cutoff).await?;
    if deleted > 0 {
        tracing::info!(deleted, retention_days, "pruned old events");
    }
    Ok(deleted)
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
