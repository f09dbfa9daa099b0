// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine thread lifecycle: the startup/shutdown readiness protocol.

use std::sync::Arc;

use herald_core::RecordStore;
use herald_engine::EngineDeps;
use herald_gemini::{CredentialPool, GeminiClient};
use herald_ingress::IngressBridge;
use herald_test_utils::MemoryRecordStore;
use teloxide::Bot;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

fn test_config() -> herald_config::HeraldConfig {
    herald_config::load_and_validate_str(
        r#"
        [telegram]
        bot_token = "123456:TEST"
        admin_ids = [99]

        [gemini]
        api_keys = ["k1"]

        [engine]
        shutdown_grace_secs = 1
        "#,
    )
    .expect("test config should validate")
}

#[tokio::test]
async fn engine_flips_ready_then_drains_on_cancel() {
    let config = test_config();

    let (bridge, updates) = IngressBridge::channel(config.engine.queue_capacity);
    let state = bridge.state();
    let cancel = CancellationToken::new();
    let (init_tx, init_rx) = oneshot::channel();

    let pool = Arc::new(CredentialPool::new(config.gemini.api_keys.clone()).unwrap());
    let gemini = Arc::new(GeminiClient::new(pool, &config.gemini).unwrap());
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());

    // No public_url configured: registration is skipped and the engine
    // must come up without any network traffic.
    assert!(!state.is_ready());
    let thread = herald_engine::spawn(EngineDeps {
        bot: Bot::new("123456:TEST"),
        gemini,
        store,
        config,
        updates,
        state: state.clone(),
        cancel: cancel.clone(),
        init_tx,
    })
    .unwrap();

    init_rx.await.unwrap().unwrap();
    assert!(state.is_ready());

    cancel.cancel();
    tokio::task::spawn_blocking(move || thread.join())
        .await
        .unwrap();

    // Shutdown flipped readiness off before draining.
    assert!(!state.is_ready());
    assert!(state.is_shutting_down());
}

#[tokio::test]
async fn submissions_are_rejected_until_the_engine_is_ready() {
    let (bridge, _updates) = IngressBridge::channel(8);

    let payload = serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {"id": 7i64, "type": "private", "first_name": "T"},
            "from": {"id": 7u64, "is_bot": false, "first_name": "T"},
            "text": "hi",
        }
    })
    .to_string();

    assert_eq!(
        bridge.submit(payload.as_bytes()),
        herald_ingress::SubmitOutcome::NotReady
    );
}
