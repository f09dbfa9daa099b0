// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Herald engine thread.
//!
//! All bot logic runs on exactly one dedicated OS thread executing a
//! current-thread tokio runtime with a `LocalSet`: handlers interleave
//! cooperatively at await points, and every shared in-memory structure
//! (conversation windows, the broadcast slot) is owned by this thread.
//! The only cross-thread structure is the handoff queue feeding it.
//!
//! Startup protocol: build the scheduler, register the webhook (when a
//! public URL is configured), then flip the shared readiness flag.
//! Shutdown protocol: flip readiness off first, stop pulling queued
//! work, then drain in-flight tasks up to a bounded grace period;
//! stragglers are aborted and logged.

mod broadcast_ctl;
mod dispatch;
pub mod history;
pub mod shutdown;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use herald_config::HeraldConfig;
use herald_core::{BroadcastOptions, HeraldError, RecipientId, RecordStore};
use herald_gemini::GeminiClient;
use herald_ingress::{EngineState, UpdateReceiver};
use herald_telegram::TelegramSender;
use teloxide::prelude::*;
use teloxide::types::Update;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::history::ConversationWindow;

/// Engine-thread-owned shared state. Lives behind an `Rc`; handlers
/// never hold a `RefCell` borrow across an await point.
pub(crate) struct Ctx {
    pub(crate) sender: TelegramSender,
    pub(crate) gemini: Arc<GeminiClient>,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) config: HeraldConfig,
    pub(crate) windows: RefCell<HashMap<RecipientId, ConversationWindow>>,
    pub(crate) slot: RefCell<BroadcastSlot>,
}

/// The single broadcast job slot. One job at a time; starting a new
/// draft while a job is running is rejected, not interleaved.
pub(crate) enum BroadcastSlot {
    Idle,
    AwaitingContent(BroadcastOptions),
    Pending(herald_broadcast::BroadcastJob),
    Running { token: CancellationToken },
}

/// Everything the engine thread needs, handed over at spawn.
pub struct EngineDeps {
    pub bot: Bot,
    pub gemini: Arc<GeminiClient>,
    pub store: Arc<dyn RecordStore>,
    pub config: HeraldConfig,
    /// Receiving half of the ingress handoff queue.
    pub updates: UpdateReceiver,
    /// Shared readiness/shutdown flags, read by the ingress layer.
    pub state: Arc<EngineState>,
    /// Cancelled by the signal handler to begin graceful shutdown.
    pub cancel: CancellationToken,
    /// Resolves once startup finishes (or fails fatally).
    pub init_tx: oneshot::Sender<Result<(), HeraldError>>,
}

/// Handle to the running engine thread.
pub struct EngineThread {
    handle: std::thread::JoinHandle<()>,
}

impl EngineThread {
    /// Blocks until the engine thread exits.
    pub fn join(self) {
        if self.handle.join().is_err() {
            error!("engine thread panicked");
        }
    }
}

/// Spawns the dedicated engine thread.
pub fn spawn(deps: EngineDeps) -> Result<EngineThread, HeraldError> {
    let handle = std::thread::Builder::new()
        .name("herald-engine".into())
        .spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(run(deps)),
                Err(e) => {
                    let message = format!("failed to build engine runtime: {e}");
                    error!("{message}");
                    let _ = deps.init_tx.send(Err(HeraldError::Internal(message)));
                }
            }
        })
        .map_err(|e| HeraldError::Internal(format!("failed to spawn engine thread: {e}")))?;
    Ok(EngineThread { handle })
}

async fn run(deps: EngineDeps) {
    let EngineDeps {
        bot,
        gemini,
        store,
        config,
        mut updates,
        state,
        cancel,
        init_tx,
    } = deps;

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            // One-time initialization: register the inbound channel with
            // the platform before accepting any work.
            if let Some(base) = config.ingress.public_url.as_deref() {
                let secret = config
                    .telegram
                    .effective_secret()
                    .unwrap_or_default()
                    .to_string();
                if let Err(e) = register_webhook(&bot, base, &secret).await {
                    error!(error = %e, "webhook registration failed");
                    let _ = init_tx.send(Err(e));
                    return;
                }
            } else {
                warn!("ingress.public_url not set, skipping webhook registration");
            }

            state.set_ready(true);
            info!("engine ready");
            if init_tx.send(Ok(())).is_err() {
                debug!("startup listener dropped");
            }

            let ctx = Rc::new(Ctx {
                sender: TelegramSender::new(bot),
                gemini,
                store,
                config: config.clone(),
                windows: RefCell::new(HashMap::new()),
                slot: RefCell::new(BroadcastSlot::Idle),
            });

            let mut tasks = tokio::task::JoinSet::new();
            loop {
                tokio::select! {
                    maybe = updates.recv() => match maybe {
                        Some(update) => {
                            // Reap finished handlers so the set stays small.
                            while tasks.try_join_next().is_some() {}
                            tasks.spawn_local(handle_update(ctx.clone(), update));
                        }
                        None => {
                            info!("handoff queue closed");
                            break;
                        }
                    },
                    _ = cancel.cancelled() => {
                        info!("shutdown requested, stopping engine loop");
                        break;
                    }
                }
            }

            // Reject new submissions before draining anything.
            state.begin_shutdown();
            updates.close();

            let mut dropped = 0usize;
            while updates.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                warn!(dropped, "dropped queued updates during shutdown");
            }

            drain(
                &mut tasks,
                Duration::from_secs(config.engine.shutdown_grace_secs),
            )
            .await;
            info!("engine stopped");
        })
        .await;
}

/// The taxonomy-6 boundary: no handler error crosses into the scheduler.
async fn handle_update(ctx: Rc<Ctx>, update: Update) {
    let update_id = update.id.0;
    if let Err(e) = dispatch::dispatch(ctx, update).await {
        error!(update_id, error = %e, "update handler failed");
    }
}

/// Waits for in-flight tasks up to the grace period, then abandons the
/// rest (logged, not retried).
async fn drain(tasks: &mut tokio::task::JoinSet<()>, grace: Duration) {
    if tasks.is_empty() {
        info!("no in-flight tasks to drain");
        return;
    }

    info!(in_flight = tasks.len(), "draining in-flight tasks");
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(_)) => {
                if tasks.is_empty() {
                    info!("all in-flight tasks drained");
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    abandoned = tasks.len(),
                    "grace period elapsed, abandoning in-flight tasks"
                );
                tasks.abort_all();
                break;
            }
        }
    }
}

/// Registers the webhook URL with the platform. The path segment is the
/// shared secret, so only the host is logged.
async fn register_webhook(bot: &Bot, base: &str, secret: &str) -> Result<(), HeraldError> {
    let full = format!("{}/{}", base.trim_end_matches('/'), secret);
    let webhook_url = url::Url::parse(&full)
        .map_err(|e| HeraldError::Config(format!("invalid webhook url: {e}")))?;
    let host = webhook_url.host_str().unwrap_or("<unknown>").to_string();

    bot.set_webhook(webhook_url)
        .await
        .map_err(|e| HeraldError::Channel {
            message: format!("failed to register webhook: {e}"),
            source: Some(Box::new(e)),
        })?;

    info!(host, "webhook registered");
    Ok(())
}
