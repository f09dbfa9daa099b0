// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP server built on axum.
//!
//! Two routes: the secret-path webhook receiving platform updates, and
//! an unauthenticated liveness check. The webhook handler maps bridge
//! outcomes straight onto the HTTP contract: 200 accepted, 400
//! malformed, 500 engine-not-ready.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use herald_core::HeraldError;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::bridge::{IngressBridge, SubmitOutcome};

/// Webhook server configuration (mirrors `IngressConfig` from herald-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Shared state for the axum handlers.
#[derive(Clone)]
pub struct IngressServerState {
    /// Handoff into the engine thread.
    pub bridge: IngressBridge,
    /// Secret path segment the webhook must be addressed with.
    pub secret: Arc<str>,
}

/// Builds the ingress router.
pub fn router(state: IngressServerState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/{secret}", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until the shutdown token fires.
pub async fn serve(
    config: &ServerConfig,
    state: IngressServerState,
    shutdown: CancellationToken,
) -> Result<(), HeraldError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HeraldError::Channel {
            message: format!("failed to bind ingress server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("ingress server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| HeraldError::Channel {
            message: format!("ingress server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

async fn liveness() -> &'static str {
    "herald is alive"
}

async fn webhook(
    State(state): State<IngressServerState>,
    Path(secret): Path<String>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if secret != *state.secret {
        return (StatusCode::NOT_FOUND, "not found");
    }

    match state.bridge.submit(&body) {
        SubmitOutcome::Accepted => (StatusCode::OK, "ok"),
        SubmitOutcome::Malformed => (StatusCode::BAD_REQUEST, "malformed update"),
        SubmitOutcome::NotReady => (StatusCode::INTERNAL_SERVER_ERROR, "engine not ready"),
    }
}
