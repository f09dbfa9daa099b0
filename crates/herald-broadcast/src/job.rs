// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast job state machine.
//!
//! `Drafting -> AwaitingConfirmation -> Running -> {Done | Cancelled}`.
//! The recipient snapshot is taken once at confirmation; later changes
//! to the record store never affect a running job. Cancellation is
//! cooperative: requesting it sets a token the runner checks between
//! recipients, without rolling back messages already sent.

use herald_core::{BroadcastOptions, HeraldError, Progress, Recipient};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::content::{BroadcastContent, MediaAttachment};

/// Lifecycle state of a broadcast job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Drafting,
    AwaitingConfirmation,
    Running,
    Done,
    Cancelled,
}

/// One staged-to-completion fan-out operation.
#[derive(Debug)]
pub struct BroadcastJob {
    id: Uuid,
    content: BroadcastContent,
    options: BroadcastOptions,
    snapshot: Vec<Recipient>,
    attempted: usize,
    succeeded: usize,
    failed: usize,
    status: JobStatus,
    cancel: CancellationToken,
}

impl BroadcastJob {
    /// Stages draft text (and optional media) into a new job in
    /// [`JobStatus::Drafting`], extracting trailing link buttons.
    pub fn stage(text: &str, media: Option<MediaAttachment>, options: BroadcastOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: BroadcastContent::from_draft(text, media),
            options,
            snapshot: Vec::new(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
            status: JobStatus::Drafting,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &BroadcastContent {
        &self.content
    }

    pub fn options(&self) -> BroadcastOptions {
        self.options
    }

    /// Replaces the delivery options. Only allowed before the job runs.
    pub fn set_options(&mut self, options: BroadcastOptions) -> Result<(), HeraldError> {
        match self.status {
            JobStatus::Drafting | JobStatus::AwaitingConfirmation => {
                self.options = options;
                Ok(())
            }
            other => Err(invalid_transition("set options", other)),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn snapshot(&self) -> &[Recipient] {
        &self.snapshot
    }

    /// The cooperative cancellation token for this job.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests cooperative cancellation; observed between recipients.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current counters. `total` is the snapshot size (zero until
    /// confirmation).
    pub fn progress(&self) -> Progress {
        Progress {
            attempted: self.attempted,
            succeeded: self.succeeded,
            failed: self.failed,
            total: self.snapshot.len(),
        }
    }

    /// Moves a drafted job to awaiting-confirmation (after the operator
    /// has seen the preview).
    pub fn mark_awaiting(&mut self) -> Result<(), HeraldError> {
        match self.status {
            JobStatus::Drafting => {
                self.status = JobStatus::AwaitingConfirmation;
                Ok(())
            }
            other => Err(invalid_transition("await confirmation", other)),
        }
    }

    /// Confirms the job with an immutable recipient snapshot taken at
    /// this moment, moving it to [`JobStatus::Running`].
    pub fn confirm(&mut self, snapshot: Vec<Recipient>) -> Result<(), HeraldError> {
        match self.status {
            JobStatus::AwaitingConfirmation => {
                self.snapshot = snapshot;
                self.status = JobStatus::Running;
                Ok(())
            }
            other => Err(invalid_transition("confirm", other)),
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }

    pub(crate) fn mark_done(&mut self) {
        self.status = JobStatus::Done;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.status = JobStatus::Cancelled;
    }
}

fn invalid_transition(action: &str, status: JobStatus) -> HeraldError {
    HeraldError::Internal(format!("cannot {action} a broadcast job in state {status:?}"))
}
