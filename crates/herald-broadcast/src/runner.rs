// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fan-out delivery loop.
//!
//! Iterates a confirmed job's snapshot exactly once, in snapshot order,
//! with strict per-recipient failure isolation: no delivery error ever
//! aborts the batch. Pacing keeps the loop under platform flood limits;
//! cancellation is checked between recipients only.

use std::time::Duration;

use herald_core::{HeraldError, Progress};
use tracing::{debug, warn};

use crate::job::{BroadcastJob, JobStatus};
use crate::sink::{DeliverySink, ProgressObserver};

/// Runs a confirmed job to completion (or cancellation).
///
/// Invariants on return: `attempted == recipients iterated`,
/// `succeeded + failed == attempted`, and for a [`JobStatus::Done`] job
/// `attempted == snapshot.len()`. An empty snapshot completes
/// immediately with zero counts and no sink calls.
pub async fn run_job<S, O>(
    job: &mut BroadcastJob,
    sink: &S,
    observer: &O,
    pacing: Duration,
    progress_every: usize,
) -> Result<Progress, HeraldError>
where
    S: DeliverySink + ?Sized,
    O: ProgressObserver + ?Sized,
{
    if job.status() != JobStatus::Running {
        return Err(HeraldError::Internal(format!(
            "cannot run a broadcast job in state {:?}",
            job.status()
        )));
    }

    let snapshot = job.snapshot().to_vec();
    let total = snapshot.len();
    let options = job.options();
    let mut cancelled = false;

    for (i, recipient) in snapshot.iter().enumerate() {
        if job.is_cancel_requested() {
            cancelled = true;
            break;
        }

        if i > 0 {
            tokio::time::sleep(pacing).await;
        }

        match sink.deliver(recipient, job.content(), options).await {
            Ok(delivered) => {
                job.record_success();
                if options.pin
                    && let Err(e) = sink.pin(recipient, delivered, options.silent).await
                {
                    debug!(recipient = %recipient.id, error = %e, "pin failed, continuing");
                }
            }
            Err(e) if e.is_unreachable() => {
                job.record_failure();
                debug!(recipient = %recipient.id, "recipient unreachable");
            }
            Err(e) => {
                job.record_failure();
                warn!(recipient = %recipient.id, error = %e, "delivery failed, continuing");
            }
        }

        let done_so_far = i + 1;
        if done_so_far % progress_every == 0 && done_so_far < total {
            observer.on_progress(job.progress()).await;
        }
    }

    if cancelled {
        job.mark_cancelled();
    } else {
        job.mark_done();
    }

    let progress = job.progress();
    observer.on_complete(progress).await;
    Ok(progress)
}
