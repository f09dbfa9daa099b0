// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Wires the credential pool, Gemini client, record store, ingress
//! bridge, and the dedicated engine thread, then serves the webhook
//! until a shutdown signal arrives. The HTTP layer runs on the
//! process's multi-thread runtime; all bot logic stays on the engine
//! thread behind the handoff queue.

use std::sync::Arc;

use herald_config::HeraldConfig;
use herald_core::{HeraldError, MemoryRecordStore, RecordStore};
use herald_engine::{EngineDeps, EngineThread, shutdown};
use herald_gemini::{CredentialPool, GeminiClient};
use herald_ingress::{IngressBridge, IngressServerState, ServerConfig};
use teloxide::Bot;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Runs the daemon until SIGINT/SIGTERM.
pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.engine.log_level);
    info!("starting herald");

    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| HeraldError::Config("telegram.bot_token is required".into()))?;
    let secret: Arc<str> = Arc::from(
        config
            .telegram
            .effective_secret()
            .unwrap_or_default()
            .to_owned(),
    );

    let pool = Arc::new(CredentialPool::new(config.gemini.api_keys.clone())?);
    let gemini = Arc::new(GeminiClient::new(pool, &config.gemini)?);
    // Recipient persistence is a collaborator concern; the bundled
    // store keeps records for the lifetime of the process.
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let bot = Bot::new(bot_token);

    let (bridge, updates) = IngressBridge::channel(config.engine.queue_capacity);
    let state = bridge.state();

    let cancel = shutdown::install_signal_handler();
    let (init_tx, init_rx) = oneshot::channel();

    let engine = herald_engine::spawn(EngineDeps {
        bot,
        gemini,
        store,
        config: config.clone(),
        updates,
        state,
        cancel: cancel.clone(),
        init_tx,
    })?;

    // Engine startup is fatal-or-ready: webhook registration failures
    // abort the process before the HTTP layer starts accepting traffic.
    match init_rx.await {
        Ok(Ok(())) => info!("engine initialized"),
        Ok(Err(e)) => {
            join_engine(engine).await;
            return Err(e);
        }
        Err(_) => {
            return Err(HeraldError::Internal(
                "engine thread exited before reporting startup".into(),
            ));
        }
    }

    let server_config = ServerConfig {
        host: config.ingress.host.clone(),
        port: config.ingress.port,
    };
    let server_state = IngressServerState { bridge, secret };
    herald_ingress::serve(&server_config, server_state, cancel.clone()).await?;

    // The HTTP layer is down; make sure the engine stops too.
    cancel.cancel();
    join_engine(engine).await;

    info!("herald shutdown complete");
    Ok(())
}

async fn join_engine(engine: EngineThread) {
    if tokio::task::spawn_blocking(move || engine.join())
        .await
        .is_err()
    {
        error!("failed to join engine thread");
    }
}

/// Initializes the tracing subscriber with the configured level.
/// Chatty transport crates are capped at warn.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{log_level},hyper=warn,reqwest=warn,teloxide=warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
