// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Herald bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so unrecognized keys
//! are rejected at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
///
/// Loaded from TOML files with `HERALD_*` environment variable overrides.
/// Sections default individually; required values inside them are
/// enforced by post-load validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Gemini upstream API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Webhook HTTP server settings.
    #[serde(default)]
    pub ingress: IngressConfig,

    /// Broadcast pacing and reporting settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Engine thread settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Numeric user ids allowed to run operator commands. An empty list
    /// disables the broadcast flow entirely.
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Secret path segment the webhook is served under. Defaults to the
    /// bot token, mirroring Telegram's own recommendation.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl TelegramConfig {
    /// The effective webhook path secret.
    pub fn effective_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .or(self.bot_token.as_deref())
    }
}

/// Gemini upstream API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API credential pool. Required non-empty; interchangeable keys
    /// rotated on recoverable failures.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Model identifier appended to the generateContent endpoint.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Upper bound on attempts per call; effective attempts are
    /// `min(api_keys.len(), attempt_cap)`.
    #[serde(default = "default_attempt_cap")]
    pub attempt_cap: u32,

    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            attempt_cap: default_attempt_cap(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_attempt_cap() -> u32 {
    4
}

fn default_attempt_timeout_secs() -> u64 {
    50
}

/// Webhook HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngressConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL used to register the webhook.
    /// Absent: registration is skipped (useful behind an existing
    /// registration or in tests); only that feature degrades.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Broadcast pacing and reporting settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Minimum interval between consecutive sends, in milliseconds.
    /// Keeps the fan-out under the platform flood limits.
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,

    /// Emit a progress update to the operator every this many recipients.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            pace_ms: default_pace_ms(),
            progress_every: default_progress_every(),
        }
    }
}

fn default_pace_ms() -> u64 {
    50
}

fn default_progress_every() -> usize {
    20
}

/// Engine thread settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Conversation window bound per user; oldest turns trimmed first.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Capacity of the cross-thread handoff queue. A full queue rejects
    /// submissions as not-ready.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Grace period for draining in-flight tasks at shutdown, in seconds.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            queue_capacity: default_queue_capacity(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            log_level: default_log_level(),
        }
    }
}

fn default_history_limit() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
