// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery and progress traits the fan-out runner is generic over.
//!
//! The Telegram implementation lives in `herald-telegram`; tests use
//! the recording mocks from `herald-test-utils`.

use async_trait::async_trait;
use herald_core::{BroadcastOptions, HeraldError, Progress, Recipient};

use crate::content::BroadcastContent;

/// Handle to a message delivered to one recipient, used for follow-up
/// operations (pinning).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub message_id: i32,
}

/// Delivers staged broadcast content to a single recipient.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Attempts one delivery. Returns [`HeraldError::Unreachable`] when
    /// the recipient cannot be reached (blocked the bot, chat gone);
    /// any error leaves the rest of the batch unaffected.
    async fn deliver(
        &self,
        recipient: &Recipient,
        content: &BroadcastContent,
        options: BroadcastOptions,
    ) -> Result<DeliveredMessage, HeraldError>;

    /// Attempts to pin a delivered message in the recipient chat.
    /// Callers swallow failures.
    async fn pin(
        &self,
        recipient: &Recipient,
        message: DeliveredMessage,
        silent: bool,
    ) -> Result<(), HeraldError>;
}

/// Receives periodic and final progress reports from a running job.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Called every configured number of recipients.
    async fn on_progress(&self, progress: Progress);

    /// Called once when the job finishes, whether done or cancelled.
    async fn on_complete(&self, progress: Progress);
}
