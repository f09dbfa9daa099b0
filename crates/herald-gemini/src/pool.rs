// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rotating credential pool for the upstream API.
//!
//! Credentials are interchangeable; the pool keeps one process-wide
//! cursor advanced atomically on rotation. Concurrent callers may race
//! on the cursor -- the worst case is a credential skipped or reused out
//! of turn, which is harmless.

use std::sync::atomic::{AtomicUsize, Ordering};

use herald_core::HeraldError;
use tracing::info;

/// An ordered, non-empty set of upstream API credentials with a
/// rotating cursor.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Builds a pool from the configured credential list.
    ///
    /// Zero credentials is a configuration error, fatal at startup.
    pub fn new(keys: Vec<String>) -> Result<Self, HeraldError> {
        if keys.is_empty() {
            return Err(HeraldError::Config(
                "credential pool requires at least one key".into(),
            ));
        }
        info!(keys = keys.len(), "credential pool initialized");
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The credential currently selected by the cursor.
    pub fn current(&self) -> &str {
        let index = self.cursor.load(Ordering::Relaxed) % self.keys.len();
        &self.keys[index]
    }

    /// Advances the cursor to the next credential and returns it.
    ///
    /// A single atomic increment; wraps around the pool.
    pub fn rotate(&self) -> &str {
        let prev = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        let next = (prev + 1) % self.keys.len();
        info!(
            from = mask(&self.keys[prev]),
            to = mask(&self.keys[next]),
            "rotating upstream credential"
        );
        &self.keys[next]
    }
}

/// Masks a credential for logging: first and last four characters only.
fn mask(key: &str) -> String {
    if key.len() > 8
        && let (Some(head), Some(tail)) = (key.get(..4), key.get(key.len() - 4..))
    {
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}
