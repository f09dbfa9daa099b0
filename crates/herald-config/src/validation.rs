// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Figment guarantees the shape of the config; this module enforces the
//! values the daemon cannot start without. Every problem is collected so
//! the operator sees the full list in one run.

use thiserror::Error;

use crate::model::HeraldConfig;

/// A single configuration problem, keyed by the offending config path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is absent.
    #[error("`{key}` is required: {hint}")]
    MissingRequired { key: String, hint: String },

    /// A present value is unusable.
    #[error("`{key}` is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// Validates a loaded configuration, collecting every problem found.
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match config.telegram.bot_token.as_deref() {
        None => errors.push(ConfigError::MissingRequired {
            key: "telegram.bot_token".into(),
            hint: "set it in herald.toml or via HERALD_TELEGRAM_BOT_TOKEN".into(),
        }),
        Some("") => errors.push(ConfigError::Invalid {
            key: "telegram.bot_token".into(),
            reason: "must not be empty".into(),
        }),
        Some(_) => {}
    }

    if config.gemini.api_keys.is_empty() {
        errors.push(ConfigError::MissingRequired {
            key: "gemini.api_keys".into(),
            hint: "provide at least one credential, e.g. HERALD_GEMINI_API_KEYS='[\"key\"]'"
                .into(),
        });
    } else if config.gemini.api_keys.iter().any(|k| k.is_empty()) {
        errors.push(ConfigError::Invalid {
            key: "gemini.api_keys".into(),
            reason: "credentials must not be empty strings".into(),
        });
    }

    if config.gemini.attempt_cap == 0 {
        errors.push(ConfigError::Invalid {
            key: "gemini.attempt_cap".into(),
            reason: "must be at least 1".into(),
        });
    }

    if let Some(url) = config.ingress.public_url.as_deref() {
        match url::Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "https" || parsed.scheme() == "http" => {}
            Ok(parsed) => errors.push(ConfigError::Invalid {
                key: "ingress.public_url".into(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            }),
            Err(e) => errors.push(ConfigError::Invalid {
                key: "ingress.public_url".into(),
                reason: e.to_string(),
            }),
        }
    }

    if config.broadcast.progress_every == 0 {
        errors.push(ConfigError::Invalid {
            key: "broadcast.progress_every".into(),
            reason: "must be at least 1".into(),
        });
    }

    if config.engine.history_limit == 0 {
        errors.push(ConfigError::Invalid {
            key: "engine.history_limit".into(),
            reason: "must be at least 1".into(),
        });
    }

    if config.engine.queue_capacity == 0 {
        errors.push(ConfigError::Invalid {
            key: "engine.queue_capacity".into(),
            reason: "must be at least 1".into(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
