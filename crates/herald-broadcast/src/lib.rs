// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast fan-out engine for Herald.
//!
//! One drafted message to an arbitrary-size recipient snapshot, with
//! per-recipient failure isolation, rate pacing, progress reporting,
//! and cooperative cancellation. The delivery transport is abstracted
//! behind [`DeliverySink`]; `herald-telegram` provides the real one.

pub mod content;
pub mod job;
pub mod runner;
pub mod sink;

pub use content::{BroadcastContent, LinkButton, MediaAttachment, extract_buttons};
pub use job::{BroadcastJob, JobStatus};
pub use runner::run_job;
pub use sink::{DeliveredMessage, DeliverySink, ProgressObserver};
