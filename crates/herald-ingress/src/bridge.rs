// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-thread handoff from the HTTP layer to the engine thread.
//!
//! The bridge is the only structure shared between the request-serving
//! threads and the engine: a bounded mpsc queue guarded by an atomic
//! readiness flag. Request threads never touch engine-owned state, and
//! `submit` returns before any bot-side work happens.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use teloxide::types::Update;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Readiness and shutdown flags for the engine thread.
///
/// `ready` flips true exactly once at startup, after the engine's
/// scheduler is running and the inbound channel is registered, and
/// flips false first thing during graceful shutdown. The ingress layer
/// reads it on every request.
#[derive(Debug, Default)]
pub struct EngineState {
    ready: AtomicBool,
    shutting_down: AtomicBool,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Flips `ready` off before anything else so new submissions are
    /// rejected while in-flight work drains.
    pub fn begin_shutdown(&self) {
        self.ready.store(false, Ordering::Release);
        self.shutting_down.store(true, Ordering::Release);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}

/// Outcome of one webhook submission, reported synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Parsed and enqueued; processing happens later on the engine thread.
    Accepted,
    /// The engine is not accepting work (starting up, shutting down, or
    /// the queue is full). Transient: the platform retries.
    NotReady,
    /// The payload does not parse into an update. Client error, never
    /// retried by us.
    Malformed,
}

/// Receiving half of the handoff queue, owned by the engine thread.
pub type UpdateReceiver = mpsc::Receiver<Update>;

/// Producer half of the handoff, shared by the HTTP handlers.
#[derive(Clone)]
pub struct IngressBridge {
    state: Arc<EngineState>,
    tx: mpsc::Sender<Update>,
}

impl IngressBridge {
    /// Creates the bridge and the engine-side receiver.
    pub fn channel(capacity: usize) -> (Self, UpdateReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                state: Arc::new(EngineState::new()),
                tx,
            },
            rx,
        )
    }

    /// The shared engine state; the engine thread flips it, the HTTP
    /// layer reads it.
    pub fn state(&self) -> Arc<EngineState> {
        self.state.clone()
    }

    /// Hands one raw webhook payload to the engine.
    ///
    /// Synchronous and non-blocking: parse, gate on readiness, enqueue.
    /// Returns [`SubmitOutcome::Accepted`] before the update is
    /// processed -- the HTTP layer never waits on bot logic.
    pub fn submit(&self, raw: &[u8]) -> SubmitOutcome {
        let update: Update = match serde_json::from_slice(raw) {
            Ok(update) => update,
            Err(e) => {
                debug!(error = %e, "rejecting malformed update payload");
                return SubmitOutcome::Malformed;
            }
        };

        if !self.state.is_ready() {
            return SubmitOutcome::NotReady;
        }

        match self.tx.try_send(update) {
            Ok(()) => SubmitOutcome::Accepted,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("handoff queue full, rejecting update");
                SubmitOutcome::NotReady
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("handoff queue closed, rejecting update");
                SubmitOutcome::NotReady
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_json(update_id: u64) -> Vec<u8> {
        serde_json::json!({
            "update_id": update_id,
            "message": {
                "message_id": 1,
                "date": 1700000000i64,
                "chat": {"id": 42i64, "type": "private", "first_name": "Test"},
                "from": {"id": 42u64, "is_bot": false, "first_name": "Test"},
                "text": "hello",
            }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn submission_before_ready_is_rejected_and_not_enqueued() {
        let (bridge, mut rx) = IngressBridge::channel(8);
        assert_eq!(bridge.submit(&update_json(1)), SubmitOutcome::NotReady);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn submission_after_ready_is_observable_exactly_once() {
        let (bridge, mut rx) = IngressBridge::channel(8);
        bridge.state().set_ready(true);

        assert_eq!(bridge.submit(&update_json(7)), SubmitOutcome::Accepted);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id.0, 7);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_synchronously() {
        let (bridge, mut rx) = IngressBridge::channel(8);
        bridge.state().set_ready(true);

        assert_eq!(bridge.submit(b"not json"), SubmitOutcome::Malformed);
        assert_eq!(bridge.submit(b"{\"foo\": 1}"), SubmitOutcome::Malformed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_reports_not_ready() {
        let (bridge, mut rx) = IngressBridge::channel(1);
        bridge.state().set_ready(true);

        assert_eq!(bridge.submit(&update_json(1)), SubmitOutcome::Accepted);
        assert_eq!(bridge.submit(&update_json(2)), SubmitOutcome::NotReady);

        // Draining frees a slot again.
        rx.recv().await.unwrap();
        assert_eq!(bridge.submit(&update_json(3)), SubmitOutcome::Accepted);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_submissions() {
        let (bridge, _rx) = IngressBridge::channel(8);
        bridge.state().set_ready(true);
        assert_eq!(bridge.submit(&update_json(1)), SubmitOutcome::Accepted);

        bridge.state().begin_shutdown();
        assert!(!bridge.state().is_ready());
        assert!(bridge.state().is_shutting_down());
        assert_eq!(bridge.submit(&update_json(2)), SubmitOutcome::NotReady);
    }
}
