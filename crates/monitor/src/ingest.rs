// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP ingest surface.
//!
//! `POST /v1/events` accepts a single event object, `POST /v1/events/batch`
//! an array (or an `{"events": [...]}` envelope, which is what the
//! orchestrator's emitter sends). Malformed events are counted in the
//! `dropped` response field and never abort a batch; check-engine failures
//! on one event are logged and skipped.

use crate::checks::apply_event;
use crate::config::{MonitorConfig, MAX_BATCH_EVENTS};
use crate::normalize::normalize_event;
use crate::store::MonitorStore;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chief_core::{Clock, SystemClock};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: MonitorStore,
    pub config: Arc<MonitorConfig>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: MonitorStore, config: MonitorConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Build the ingest router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(ingest_single))
        .route("/v1/events/batch", post(ingest_batch))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Reject requests without the configured `x-api-key`. No-op when no key
/// is configured.
async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    if state.config.auth_enabled() {
        let provided = headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if provided != state.config.api_key {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthorized"})),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn ingest_single(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let outcome = ingest_values(&state, std::slice::from_ref(&payload)).await;
    (StatusCode::OK, Json(outcome)).into_response()
}

async fn ingest_batch(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let events: Vec<Value> = match payload {
        Value::Array(events) => events,
        Value::Object(mut object) => match object.remove("events") {
            Some(Value::Array(events)) => events,
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "expected an array or {\"events\": [...]}"})),
                )
                    .into_response()
            }
        },
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "expected an array or {\"events\": [...]}"})),
            )
                .into_response()
        }
    };

    if events.len() > MAX_BATCH_EVENTS {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": format!("batch exceeds {MAX_BATCH_EVENTS} events"),
            })),
        )
            .into_response();
    }

    let outcome = ingest_values(&state, &events).await;
    (StatusCode::OK, Json(outcome)).into_response()
}

async fn ingest_values(state: &AppState, payloads: &[Value]) -> Value {
    let mut inserted = 0u64;
    let mut dropped = 0u64;
    let now = state.clock.now();

    for payload in payloads {
        let Some(event) = normalize_event(payload, now) else {
            dropped += 1;
            continue;
        };
        match state.store.insert_event(&event, now).await {
            Ok(_) => inserted += 1,
            Err(err) => {
                tracing::error!(error = %err, "failed to persist event");
                dropped += 1;
                continue;
            }
        }
        // Check-engine errors skip the event, never the batch.
        if let Err(err) = apply_event(&state.store, &event, now).await {
            tracing::error!(
                error = %err,
                job = event.job_name.as_deref().unwrap_or("-"),
                "check engine failed for event"
            );
        }
    }

    json!({"inserted": inserted, "dropped": dropped})
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
