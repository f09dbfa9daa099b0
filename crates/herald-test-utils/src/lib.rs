// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Ships the recording broadcast mocks used by the fan-out tests and
//! re-exports the in-memory record store for convenience.

pub mod sink;

pub use herald_core::store::MemoryRecordStore;
pub use sink::{CollectingObserver, RecordingSink};
