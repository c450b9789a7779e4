// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort, non-blocking telemetry shipper.
//!
//! `emit()` offers to a bounded channel and never blocks: a full buffer
//! drops the event and bumps a counter. A background flusher drains the
//! channel in batches, POSTs to the monitor, and falls back to the disk
//! spool on any send failure. Each flush tick also attempts one spool
//! replay from the head.

use crate::spool::Spool;
use async_trait::async_trait;
use chief_core::TelemetryEvent;
use chief_config::MonitorSettings;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Events per batch POST; the monitor caps batch requests well above this.
const BATCH_LIMIT: usize = 250;

/// Ships one batch of event payloads. Implementations return `true` only
/// for a 2xx response; everything else (network error, timeout, non-2xx)
/// is a failed send.
#[async_trait]
pub trait BatchSender: Send + Sync {
    async fn send(&self, payloads: &[Value]) -> bool;
}

/// Production sender: POST to `{endpoint}/v1/events/batch` with an optional
/// `x-api-key` header and a per-request deadline.
pub struct HttpBatchSender {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpBatchSender {
    pub fn new(endpoint: &str, api_key: &str, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(100)))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: format!("{}/v1/events/batch", endpoint.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl BatchSender for HttpBatchSender {
    async fn send(&self, payloads: &[Value]) -> bool {
        let mut request = self.client.post(&self.url).json(&json!({ "events": payloads }));
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }
        match request.send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                if !ok {
                    tracing::warn!(status = %response.status(), "telemetry batch rejected");
                }
                ok
            }
            Err(err) => {
                tracing::warn!(error = %err, "telemetry batch send failed");
                false
            }
        }
    }
}

struct Inner {
    tx: mpsc::Sender<TelemetryEvent>,
    dropped: AtomicU64,
    stop: Notify,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the telemetry pipeline. Cheap to clone; all clones share the
/// same buffer. A disabled emitter (telemetry off) swallows every event.
#[derive(Clone)]
pub struct TelemetryEmitter {
    inner: Option<Arc<Inner>>,
}

impl TelemetryEmitter {
    /// Emitter that discards everything; used when telemetry is disabled.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Start the background flusher with the production HTTP sender.
    pub fn start(settings: &MonitorSettings) -> Self {
        if !settings.enabled {
            tracing::info!("telemetry disabled; events will not be sent");
            return Self::disabled();
        }
        let sender = HttpBatchSender::new(
            &settings.endpoint,
            &settings.api_key,
            settings.timeout_ms,
        );
        Self::start_with_sender(settings, Arc::new(sender))
    }

    /// Start with an injected sender (tests use a recording sender).
    pub fn start_with_sender(
        settings: &MonitorSettings,
        sender: Arc<dyn BatchSender>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(settings.buffer.max_events.max(1));
        let inner = Arc::new(Inner {
            tx,
            dropped: AtomicU64::new(0),
            stop: Notify::new(),
            task: parking_lot::Mutex::new(None),
        });
        let flusher = Flusher {
            rx,
            sender,
            spool: Spool::new(settings.buffer.spool_file.clone()),
            flush_interval: Duration::from_millis(settings.buffer.flush_interval_ms.max(50)),
        };
        let task = tokio::spawn(flusher.run(Arc::clone(&inner)));
        *inner.task.lock() = Some(task);
        Self { inner: Some(inner) }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Offer an event to the buffer. Never blocks, never errors: a full
    /// buffer drops the event and records the loss.
    pub fn emit(&self, event: TelemetryEvent) {
        let Some(inner) = &self.inner else {
            return;
        };
        if inner.tx.try_send(event).is_err() {
            let dropped = inner.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(dropped, "telemetry buffer full; dropping event");
        }
    }

    /// Emit only when the per-job monitor flag allows it.
    pub fn emit_if(&self, enabled: bool, event: TelemetryEvent) {
        if enabled {
            self.emit(event);
        }
    }

    /// Events dropped due to buffer overflow.
    pub fn dropped_count(&self) -> u64 {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.dropped.load(Ordering::Relaxed))
    }

    /// Stop accepting events, flush the buffer once, attempt one spool
    /// replay, then return. Bounded by the join timeout.
    pub async fn close(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        inner.stop.notify_one();
        let task = inner.task.lock().take();
        if let Some(task) = task {
            if tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .is_err()
            {
                tracing::warn!("telemetry flusher did not stop in time");
            }
        }
    }
}

struct Flusher {
    rx: mpsc::Receiver<TelemetryEvent>,
    sender: Arc<dyn BatchSender>,
    spool: Spool,
    flush_interval: Duration,
}

impl Flusher {
    async fn run(mut self, inner: Arc<Inner>) {
        loop {
            let stopping = self.collect_and_flush(&inner).await;
            if stopping {
                break;
            }
        }
        // Shutdown: one final drain of whatever is still buffered, then one
        // last replay attempt.
        self.flush_remaining().await;
        self.replay_spool().await;
    }

    /// Collect a batch until the flush interval elapses or the batch limit
    /// is reached, then ship it. Returns true when shutdown was requested.
    async fn collect_and_flush(&mut self, inner: &Arc<Inner>) -> bool {
        let deadline = tokio::time::Instant::now() + self.flush_interval;
        let mut batch: Vec<Value> = Vec::new();
        let mut stopping = false;

        while batch.len() < BATCH_LIMIT {
            tokio::select! {
                _ = inner.stop.notified() => {
                    stopping = true;
                    break;
                }
                _ = tokio::time::sleep_until(deadline) => break,
                event = self.rx.recv() => match event {
                    Some(event) => batch.push(to_payload(&event)),
                    None => {
                        stopping = true;
                        break;
                    }
                },
            }
        }

        self.ship(batch).await;
        self.replay_spool().await;
        stopping
    }

    async fn flush_remaining(&mut self) {
        let mut batch = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            batch.push(to_payload(&event));
            if batch.len() == BATCH_LIMIT {
                self.ship(std::mem::take(&mut batch)).await;
            }
        }
        self.ship(batch).await;
    }

    async fn ship(&self, batch: Vec<Value>) {
        if batch.is_empty() {
            return;
        }
        if !self.sender.send(&batch).await {
            self.spool.append(&batch);
        }
    }

    /// Replay one head window from the spool. The file is only rewritten
    /// when the re-send succeeds (or the head window held no valid JSON),
    /// so a dead monitor leaves the spool intact.
    async fn replay_spool(&self) {
        let Some(batch) = self.spool.read_head(BATCH_LIMIT) else {
            return;
        };
        if batch.payloads.is_empty() {
            self.spool.commit(&batch);
            return;
        }
        if self.sender.send(&batch.payloads).await {
            self.spool.commit(&batch);
        }
    }
}

fn to_payload(event: &TelemetryEvent) -> Value {
    serde_json::to_value(event).unwrap_or_else(|_| json!({}))
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
