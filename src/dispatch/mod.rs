//! Bounded-concurrency dispatch engine.
//!
//! [`Dispatcher::run`] admits records one at a time, each into its own
//! task holding a semaphore permit for the record's whole lifetime
//! (every attempt and every backoff sleep). Finished outcomes are handed
//! to a single draining callback in completion order, which makes that
//! callback the only writer of sinks and counters. Submodules hold the
//! per-record state machine ([`executor`]) and the response
//! interpretation ([`classify`]).

pub mod classify;
pub mod executor;
pub mod outcome;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub use executor::{RequestExecutor, RetryPolicy};
pub use outcome::Outcome;

use crate::payload::Record;

pub struct Dispatcher {
    executor: RequestExecutor,
    concurrency: usize,
}

impl Dispatcher {
    /// `concurrency` is clamped to at least one in-flight record.
    #[must_use]
    pub fn new(executor: RequestExecutor, concurrency: usize) -> Self {
        Self {
            executor,
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Dispatch every record and feed each outcome to `on_outcome` as it
    /// completes. Returns once all admitted records have finished, or with
    /// the first error `on_outcome` returns (remaining tasks are aborted).
    pub async fn run<I, F, E>(&self, records: I, mut on_outcome: F) -> Result<usize, E>
    where
        I: IntoIterator<Item = Record>,
        F: FnMut(Outcome) -> Result<(), E>,
    {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut pending = records.into_iter();
        let mut in_flight: JoinSet<Outcome> = JoinSet::new();
        let mut admitting = true;
        let mut completed = 0usize;

        loop {
            tokio::select! {
                biased;

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    match joined {
                        Ok(outcome) => {
                            completed += 1;
                            on_outcome(outcome)?;
                        }
                        // Wrappers catch executor panics and are only cancelled
                        // when this JoinSet drops, so no outcome is lost here.
                        Err(e) => tracing::error!(error = %e, "record task aborted"),
                    }
                }

                permit = Arc::clone(&permits).acquire_owned(), if admitting => {
                    let Ok(permit) = permit else {
                        // The semaphore is never closed while this loop runs.
                        admitting = false;
                        continue;
                    };
                    let Some(record) = pending.next() else {
                        admitting = false;
                        continue;
                    };
                    let executor = self.executor.clone();
                    in_flight.spawn(async move {
                        let _permit = permit;
                        run_lifetime(executor, record).await
                    });
                }

                else => break,
            }
        }

        Ok(completed)
    }
}

/// One record from first attempt to terminal outcome. A panic inside the
/// executor still produces exactly one (failed) outcome for the record.
async fn run_lifetime(executor: RequestExecutor, record: Record) -> Outcome {
    let external_id = record.external_id.clone();
    match tokio::spawn(async move { executor.execute(&record).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(external_id = %external_id, error = %e, "executor task failed");
            Outcome::failure(
                &external_id,
                None,
                None,
                String::new(),
                format!("executor task failed: {e}"),
            )
        }
    }
}
