// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Herald workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Numeric identity of a user or group chat, as assigned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(pub i64);

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a recipient is a direct-message user or a group chat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    User,
    Group,
}

/// Delivery reachability as observed by past send attempts.
///
/// Only delivery attempts move this state; nothing else mutates it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Unknown,
    Ok,
    Blocked,
}

/// A user or group identity that may receive a delivered message.
///
/// Created on first contact. The core never deletes recipients; pruning
/// is a storage-layer concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub kind: RecipientKind,
    pub reachability: Reachability,
}

impl Recipient {
    /// A freshly contacted recipient with unknown reachability.
    pub fn new(id: RecipientId, kind: RecipientKind) -> Self {
        Self {
            id,
            kind,
            reachability: Reachability::Unknown,
        }
    }
}

/// The kind of activity a recipient performed, for usage bookkeeping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Text,
    Photo,
    Command,
}

/// The closed set of media kinds a broadcast draft may carry.
///
/// Selected once at draft time from whichever field of the source
/// message is populated; delivery dispatches on this tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Voice,
    Audio,
    Sticker,
}

/// Operator-chosen delivery options applied uniformly to a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastOptions {
    /// Attempt to pin the delivered message in each recipient chat.
    /// Pin failures are logged and swallowed, never counted as send failures.
    pub pin: bool,
    /// Suppress the notification sound on delivery.
    pub silent: bool,
}

/// Running counters for a broadcast, reported to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Size of the recipient snapshot the job was confirmed with.
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} attempted, {} succeeded, {} failed",
            self.attempted, self.total, self.succeeded, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_recipient_starts_unknown() {
        let r = Recipient::new(RecipientId(42), RecipientKind::User);
        assert_eq!(r.reachability, Reachability::Unknown);
    }

    #[test]
    fn progress_display_reads_naturally() {
        let p = Progress {
            attempted: 40,
            succeeded: 38,
            failed: 2,
            total: 100,
        };
        assert_eq!(p.to_string(), "40/100 attempted, 38 succeeded, 2 failed");
    }

    #[test]
    fn recipient_kind_serializes_lowercase() {
        let json = serde_json::to_string(&RecipientKind::Group).unwrap();
        assert_eq!(json, "\"group\"");
    }
}
