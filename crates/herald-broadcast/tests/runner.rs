// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the fan-out delivery loop.
//!
//! These live as an integration test (rather than an inline `#[cfg(test)]`
//! module) because they depend on `herald-test-utils`, which in turn depends
//! on `herald-broadcast`. Compiling them against the normal library build
//! keeps the `DeliverySink`/`ProgressObserver` trait identities unified with
//! the recording mocks.

use std::time::Duration;

use herald_broadcast::job::BroadcastJob;
use herald_broadcast::{JobStatus, run_job};
use herald_core::{BroadcastOptions, Progress, Recipient, RecipientId, RecipientKind};
use herald_test_utils::{CollectingObserver, RecordingSink};

fn users(n: usize) -> Vec<Recipient> {
    (1..=n as i64)
        .map(|id| Recipient::new(RecipientId(id), RecipientKind::User))
        .collect()
}

fn running_job(snapshot: Vec<Recipient>, options: BroadcastOptions) -> BroadcastJob {
    let mut job = BroadcastJob::stage("payload", None, options);
    job.mark_awaiting().unwrap();
    job.confirm(snapshot).unwrap();
    job
}

const PACE: Duration = Duration::from_millis(50);

#[tokio::test(start_paused = true)]
async fn counters_always_add_up() {
    let sink = RecordingSink::new()
        .unreachable_for([RecipientId(2)])
        .failing_for([RecipientId(4)]);
    let observer = CollectingObserver::new();
    let mut job = running_job(users(5), BroadcastOptions::default());

    let progress = run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    assert_eq!(progress.attempted, 5);
    assert_eq!(progress.succeeded, 3);
    assert_eq!(progress.failed, 2);
    assert_eq!(progress.succeeded + progress.failed, progress.attempted);
    assert_eq!(job.status(), JobStatus::Done);
    assert_eq!(sink.delivered().await.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn empty_snapshot_completes_with_zero_counts() {
    let sink = RecordingSink::new();
    let observer = CollectingObserver::new();
    let mut job = running_job(vec![], BroadcastOptions::default());

    let progress = run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    assert_eq!(progress, Progress::default());
    assert_eq!(job.status(), JobStatus::Done);
    assert!(sink.delivered().await.is_empty());
    assert_eq!(observer.completions().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_k_stops_further_sends() {
    let sink = RecordingSink::new();
    let observer = CollectingObserver::new();
    let mut job = running_job(users(10), BroadcastOptions::default());
    sink.cancel_after(3, job.cancel_token()).await;

    let progress = run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    assert_eq!(progress.attempted, 3);
    assert_eq!(job.status(), JobStatus::Cancelled);
    assert_eq!(sink.delivered().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn pin_failures_are_swallowed() {
    let sink = RecordingSink::new().with_pin_failures();
    let observer = CollectingObserver::new();
    let mut job = running_job(
        users(3),
        BroadcastOptions {
            pin: true,
            silent: false,
        },
    );

    let progress = run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    assert_eq!(progress.succeeded, 3);
    assert_eq!(progress.failed, 0);
    assert_eq!(job.status(), JobStatus::Done);
}

#[tokio::test(start_paused = true)]
async fn pins_are_attempted_for_each_success() {
    let sink = RecordingSink::new().unreachable_for([RecipientId(2)]);
    let observer = CollectingObserver::new();
    let mut job = running_job(
        users(3),
        BroadcastOptions {
            pin: true,
            silent: true,
        },
    );

    run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    assert_eq!(sink.pinned().await, vec![RecipientId(1), RecipientId(3)]);
}

#[tokio::test(start_paused = true)]
async fn progress_reported_on_the_configured_cadence() {
    let sink = RecordingSink::new();
    let observer = CollectingObserver::new();
    let mut job = running_job(users(45), BroadcastOptions::default());

    run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    let reports = observer.reports().await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].attempted, 20);
    assert_eq!(reports[1].attempted, 40);

    let completions = observer.completions().await;
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].attempted, 45);
}

#[tokio::test(start_paused = true)]
async fn pacing_sleeps_between_sends_only() {
    let sink = RecordingSink::new();
    let observer = CollectingObserver::new();
    let mut job = running_job(users(4), BroadcastOptions::default());

    let started = tokio::time::Instant::now();
    run_job(&mut job, &sink, &observer, PACE, 20).await.unwrap();

    // Three gaps between four sends; no trailing sleep.
    assert_eq!(started.elapsed(), PACE * 3);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_job_is_rejected() {
    let sink = RecordingSink::new();
    let observer = CollectingObserver::new();
    let mut job = BroadcastJob::stage("hi", None, BroadcastOptions::default());

    let result = run_job(&mut job, &sink, &observer, PACE, 20).await;
    assert!(result.is_err());
    assert!(sink.delivered().await.is_empty());
}
