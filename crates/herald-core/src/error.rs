// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald bot.
//!
//! One variant per failure class so call sites can branch on how a
//! failure must be handled: reject to the HTTP caller, retry with a
//! rotated credential, record and continue, or log and keep serving.

use thiserror::Error;

use crate::types::RecipientId;

/// The primary error type used across all Herald crates.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (missing required values, invalid TOML, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound webhook payload that does not parse into an update. Client
    /// error: surfaced as HTTP 400, never retried.
    #[error("malformed update payload: {0}")]
    MalformedUpdate(String),

    /// The engine thread is not (or no longer) accepting work. Transient
    /// server error: surfaced as HTTP 500, the platform retries.
    #[error("engine is not ready to accept work")]
    EngineNotReady,

    /// A recipient cannot be delivered to (blocked the bot, deactivated
    /// account, chat gone). Recorded per recipient, never fatal to a batch.
    #[error("recipient {recipient} is unreachable")]
    Unreachable { recipient: RecipientId },

    /// Recoverable upstream failure (rate limit, overload, transport).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-recoverable upstream failure (request rejected, unparseable
    /// response). Aborts the single operation with no further attempts.
    #[error("upstream rejected the request: {message}")]
    UpstreamFatal { message: String },

    /// All retry attempts across the credential pool were consumed.
    #[error("upstream attempts exhausted after {attempts} tries")]
    Exhausted { attempts: u32 },

    /// Telegram delivery errors other than unreachable recipients.
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Record store errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors. Caught at every task boundary and
    /// logged; the engine keeps serving other work.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// True when the failure is isolated to a single recipient and a
    /// broadcast batch should record it and continue.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, HeraldError::Unreachable { .. })
    }
}
