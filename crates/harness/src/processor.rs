//! Paced, batched draining of a [`RequestQueue`].

use crate::{
    dispatcher::RequestDispatcher,
    ledger::ResultLedger,
    outcome::Outcome,
    request::RequestQueue,
    sink::ResultSink,
    transport::RpcTransport,
};
use futures::StreamExt;
use std::{num::NonZeroUsize, time::Duration};
use tracing::{debug, info, warn};

/// Drains a request queue in fixed-size batches.
///
/// Each batch is dispatched concurrently and awaited as a whole: the slowest request decides
/// when the batch is done, and a failing request never cancels its siblings. Outcomes are then
/// recorded in completion order. If more requests are queued, the processor sleeps for the
/// batch delay before taking the next batch, so throughput is roughly
/// `batch_size / (dispatch time + batch_delay)`.
#[derive(Debug, Clone, Copy)]
pub struct BatchQueueProcessor {
    batch_size: NonZeroUsize,
    batch_delay: Duration,
}

impl BatchQueueProcessor {
    /// Creates a new processor.
    pub const fn new(batch_size: NonZeroUsize, batch_delay: Duration) -> Self {
        Self { batch_size, batch_delay }
    }

    /// Maximum number of requests per batch.
    pub const fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Pause between two batches.
    pub const fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// Drains `queue` until it is empty.
    ///
    /// Every dispatched request yields exactly one outcome in `ledger` and one entry in the
    /// results stream of `sink`.
    pub async fn drain<T, S>(
        &self,
        queue: &mut RequestQueue,
        dispatcher: &RequestDispatcher<T>,
        ledger: &mut ResultLedger,
        sink: &mut S,
    ) -> DrainReport
    where
        T: RpcTransport,
        S: ResultSink,
    {
        let mut report = DrainReport::default();

        while !queue.is_empty() {
            let batch = queue.drain_batch(self.batch_size.get());
            let number = report.batches.len() + 1;
            let size = batch.len();
            info!(target: "zkprobe::batch", batch = number, requests = size, "Processing batch");

            let outcomes: Vec<Outcome> = futures::stream::iter(
                batch.into_iter().map(|request| dispatcher.dispatch(request)),
            )
            .buffer_unordered(size)
            .collect()
            .await;

            let mut batch_report = BatchReport { number, size, ..Default::default() };
            for outcome in outcomes {
                batch_report.count(&outcome);
                self.record(outcome, ledger, sink);
            }
            info!(
                target: "zkprobe::batch",
                batch = number,
                succeeded = batch_report.succeeded,
                failed = batch_report.failed,
                skipped = batch_report.skipped,
                "Batch complete"
            );
            report.batches.push(batch_report);

            if !queue.is_empty() && !self.batch_delay.is_zero() {
                debug!(target: "zkprobe::batch", delay = ?self.batch_delay, "Waiting before next batch");
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        report
    }

    /// Logs and records one outcome, also for outcomes obtained outside the batching path.
    ///
    /// The outcome always lands in the ledger; sink write failures are logged and swallowed.
    pub fn record<S: ResultSink>(&self, outcome: Outcome, ledger: &mut ResultLedger, sink: &mut S) {
        log_outcome(&outcome);
        if let Err(err) = sink.record(&outcome) {
            warn!(target: "zkprobe::batch", method = %outcome.method, %err, "Failed to write result entry");
        }
        if !outcome.is_success() {
            if let Err(err) = sink.record_error(&outcome) {
                warn!(target: "zkprobe::batch", method = %outcome.method, %err, "Failed to write error entry");
            }
        }
        ledger.append(outcome);
    }

    /// Records a method that is deliberately not exercised.
    pub fn record_skip<S: ResultSink>(
        &self,
        method: &str,
        reason: &str,
        ledger: &mut ResultLedger,
        sink: &mut S,
    ) {
        self.record(Outcome::skipped(method, reason), ledger, sink);
    }
}

fn log_outcome(outcome: &Outcome) {
    let duration = outcome.duration;
    match &outcome.result {
        Ok(_) => info!(target: "zkprobe::batch", method = %outcome.method, ?duration, "✓ Success"),
        Err(err) if outcome.is_skipped() => {
            info!(target: "zkprobe::batch", method = %outcome.method, reason = %err.message, "- Skipped")
        }
        Err(err) => warn!(
            target: "zkprobe::batch",
            method = %outcome.method,
            code = %err.kind.code(),
            error = %err.message,
            "✗ Failed"
        ),
    }
}

/// Summary of one [`BatchQueueProcessor::drain`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// One entry per batch, in dispatch order.
    pub batches: Vec<BatchReport>,
}

impl DrainReport {
    /// Sizes of all batches, in dispatch order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(|batch| batch.size).collect()
    }

    /// Total number of dispatched requests.
    pub fn dispatched(&self) -> usize {
        self.batches.iter().map(|batch| batch.size).sum()
    }
}

/// Counts for one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// 1-based batch number within the drain.
    pub number: usize,
    /// Number of requests in the batch.
    pub size: usize,
    /// Successful outcomes.
    pub succeeded: usize,
    /// Transport and protocol failures.
    pub failed: usize,
    /// Skipped outcomes.
    pub skipped: usize,
}

impl BatchReport {
    fn count(&mut self, outcome: &Outcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else if outcome.is_skipped() {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }
    }
}
