// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald bot.
//!
//! This crate provides the error taxonomy, domain types, and the record
//! store collaborator trait shared by every other Herald crate.

pub mod error;
pub mod store;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HeraldError;
pub use store::{MemoryRecordStore, RecordStore};
pub use types::{
    ActivityKind, BroadcastOptions, MediaKind, Progress, Reachability, Recipient, RecipientId,
    RecipientKind,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herald_error_has_all_taxonomy_variants() {
        let _config = HeraldError::Config("test".into());
        let _malformed = HeraldError::MalformedUpdate("test".into());
        let _not_ready = HeraldError::EngineNotReady;
        let _unreachable = HeraldError::Unreachable {
            recipient: RecipientId(1),
        };
        let _upstream = HeraldError::Upstream {
            message: "test".into(),
            source: None,
        };
        let _fatal = HeraldError::UpstreamFatal {
            message: "test".into(),
        };
        let _exhausted = HeraldError::Exhausted { attempts: 3 };
        let _channel = HeraldError::Channel {
            message: "test".into(),
            source: None,
        };
        let _storage = HeraldError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = HeraldError::Timeout {
            duration: std::time::Duration::from_secs(50),
        };
        let _internal = HeraldError::Internal("test".into());
    }

    #[test]
    fn media_kind_round_trips_through_strings() {
        use std::str::FromStr;
        for kind in [
            MediaKind::Photo,
            MediaKind::Video,
            MediaKind::Document,
            MediaKind::Voice,
            MediaKind::Audio,
            MediaKind::Sticker,
        ] {
            let text = kind.to_string();
            assert_eq!(MediaKind::from_str(&text).unwrap(), kind);
        }
    }
}
