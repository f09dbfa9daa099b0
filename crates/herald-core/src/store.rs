// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store collaborator trait and the bundled in-memory backend.
//!
//! Herald treats recipient persistence as an external collaborator: the
//! engine only needs first-contact registration, activity bookkeeping,
//! ban checks, and a snapshot source for broadcasts. Persistent
//! backends implement [`RecordStore`]; [`MemoryRecordStore`] is the
//! process-local default.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::{ActivityKind, Reachability, Recipient, RecipientId};

/// Persistence surface consumed by the engine and the broadcast flow.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Registers a recipient on first contact. Upsert semantics: an
    /// already-known recipient keeps its stored reachability.
    async fn record_contact(&self, recipient: Recipient) -> Result<(), HeraldError>;

    /// Records one unit of recipient activity for usage statistics.
    async fn record_activity(
        &self,
        id: RecipientId,
        kind: ActivityKind,
    ) -> Result<(), HeraldError>;

    /// Whether the recipient has been banned by an operator.
    async fn is_banned(&self, id: RecipientId) -> Result<bool, HeraldError>;

    /// The current broadcast recipient set. Broadcast jobs snapshot this
    /// once at confirmation time; later mutations do not affect a
    /// running job.
    async fn recipients(&self) -> Result<Vec<Recipient>, HeraldError>;

    /// Updates delivery reachability. Called only from delivery attempts.
    async fn set_reachability(
        &self,
        id: RecipientId,
        state: Reachability,
    ) -> Result<(), HeraldError>;
}

#[derive(Default)]
struct Inner {
    recipients: HashMap<RecipientId, Recipient>,
    banned: HashSet<RecipientId>,
    activity: Vec<(RecipientId, ActivityKind)>,
}

/// HashMap-backed record store.
///
/// The broadcast snapshot excludes banned recipients and is returned in
/// ascending id order so snapshots are deterministic. The lock is held
/// only for the synchronous map operations, never across an await.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds recipients directly, bypassing first-contact semantics.
    pub fn seed(&self, recipients: impl IntoIterator<Item = Recipient>) {
        if let Ok(mut inner) = self.inner.lock() {
            for r in recipients {
                inner.recipients.insert(r.id, r);
            }
        }
    }

    /// Marks a recipient as banned.
    pub fn ban(&self, id: RecipientId) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.banned.insert(id);
        }
    }

    /// Lifts a ban.
    pub fn unban(&self, id: RecipientId) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.banned.remove(&id);
        }
    }

    /// Looks up a stored recipient.
    pub fn recipient(&self, id: RecipientId) -> Option<Recipient> {
        self.inner.lock().ok()?.recipients.get(&id).cloned()
    }

    /// Activity entries recorded for one recipient.
    pub fn activity_for(&self, id: RecipientId) -> Vec<ActivityKind> {
        match self.inner.lock() {
            Ok(inner) => inner
                .activity
                .iter()
                .filter(|(rid, _)| *rid == id)
                .map(|(_, kind)| *kind)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, Inner>, HeraldError> {
        self.inner
            .lock()
            .map_err(|_| HeraldError::Internal("record store lock poisoned".into()))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn record_contact(&self, recipient: Recipient) -> Result<(), HeraldError> {
        let mut inner = self.locked()?;
        inner.recipients.entry(recipient.id).or_insert(recipient);
        Ok(())
    }

    async fn record_activity(
        &self,
        id: RecipientId,
        kind: ActivityKind,
    ) -> Result<(), HeraldError> {
        self.locked()?.activity.push((id, kind));
        Ok(())
    }

    async fn is_banned(&self, id: RecipientId) -> Result<bool, HeraldError> {
        Ok(self.locked()?.banned.contains(&id))
    }

    async fn recipients(&self) -> Result<Vec<Recipient>, HeraldError> {
        let inner = self.locked()?;
        let mut recipients: Vec<Recipient> = inner
            .recipients
            .values()
            .filter(|r| !inner.banned.contains(&r.id))
            .cloned()
            .collect();
        recipients.sort_by_key(|r| r.id);
        Ok(recipients)
    }

    async fn set_reachability(
        &self,
        id: RecipientId,
        state: Reachability,
    ) -> Result<(), HeraldError> {
        if let Some(r) = self.locked()?.recipients.get_mut(&id) {
            r.reachability = state;
        }
        Ok(())
    }
}
