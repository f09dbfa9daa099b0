// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording broadcast mocks: a scriptable [`DeliverySink`] and a
//! collecting [`ProgressObserver`].

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use herald_broadcast::{BroadcastContent, DeliveredMessage, DeliverySink, ProgressObserver};
use herald_core::{BroadcastOptions, HeraldError, Progress, Recipient, RecipientId};

/// A delivery sink that records every call and fails on demand.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<RecipientId>>,
    pinned: Mutex<Vec<RecipientId>>,
    unreachable: HashSet<RecipientId>,
    failing: HashSet<RecipientId>,
    fail_pins: bool,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// These recipients fail with [`HeraldError::Unreachable`].
    pub fn unreachable_for(mut self, ids: impl IntoIterator<Item = RecipientId>) -> Self {
        self.unreachable.extend(ids);
        self
    }

    /// These recipients fail with a channel error.
    pub fn failing_for(mut self, ids: impl IntoIterator<Item = RecipientId>) -> Self {
        self.failing.extend(ids);
        self
    }

    /// Every pin attempt fails.
    pub fn with_pin_failures(mut self) -> Self {
        self.fail_pins = true;
        self
    }

    /// Cancels `token` once `n` deliveries have been attempted.
    pub async fn cancel_after(&self, n: usize, token: CancellationToken) {
        *self.cancel_after.lock().await = Some((n, token));
    }

    /// Recipient ids of every delivery attempt, in call order.
    pub async fn delivered(&self) -> Vec<RecipientId> {
        self.delivered.lock().await.clone()
    }

    /// Recipient ids of every successful pin, in call order.
    pub async fn pinned(&self) -> Vec<RecipientId> {
        self.pinned.lock().await.clone()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(
        &self,
        recipient: &Recipient,
        _content: &BroadcastContent,
        _options: BroadcastOptions,
    ) -> Result<DeliveredMessage, HeraldError> {
        let attempts = {
            let mut delivered = self.delivered.lock().await;
            delivered.push(recipient.id);
            delivered.len()
        };

        if let Some((n, token)) = self.cancel_after.lock().await.as_ref()
            && attempts >= *n
        {
            token.cancel();
        }

        if self.unreachable.contains(&recipient.id) {
            return Err(HeraldError::Unreachable {
                recipient: recipient.id,
            });
        }
        if self.failing.contains(&recipient.id) {
            return Err(HeraldError::Channel {
                message: format!("scripted failure for {}", recipient.id),
                source: None,
            });
        }

        Ok(DeliveredMessage {
            message_id: attempts as i32,
        })
    }

    async fn pin(
        &self,
        recipient: &Recipient,
        _message: DeliveredMessage,
        _silent: bool,
    ) -> Result<(), HeraldError> {
        if self.fail_pins {
            return Err(HeraldError::Channel {
                message: "scripted pin failure".into(),
                source: None,
            });
        }
        self.pinned.lock().await.push(recipient.id);
        Ok(())
    }
}

/// An observer that collects every report for later assertion.
#[derive(Default)]
pub struct CollectingObserver {
    reports: Mutex<Vec<Progress>>,
    completions: Mutex<Vec<Progress>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reports(&self) -> Vec<Progress> {
        self.reports.lock().await.clone()
    }

    pub async fn completions(&self) -> Vec<Progress> {
        self.completions.lock().await.clone()
    }
}

#[async_trait]
impl ProgressObserver for CollectingObserver {
    async fn on_progress(&self, progress: Progress) {
        self.reports.lock().await.push(progress);
    }

    async fn on_complete(&self, progress: Progress) {
        self.completions.lock().await.push(progress);
    }
}
