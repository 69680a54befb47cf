//! One complete run: input → dispatcher → sinks, with progress.
//!
//! [`RunContext`] is the single owner of the run's mutable state (both
//! output writers, the counters, the progress reporter). The dispatcher
//! hands it outcomes one at a time, so none of it needs a lock.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Transport;
use crate::config::DispatchSettings;
use crate::dispatch::{Dispatcher, Outcome, RequestExecutor};
use crate::error::NoteDispatchError;
use crate::input;
use crate::progress::{Counters, ProgressReporter};
use crate::sink::ResultSink;

pub struct RunContext<W: Write> {
    sink: ResultSink<W>,
    counters: Counters,
    progress: ProgressReporter,
}

impl<W: Write> RunContext<W> {
    #[must_use]
    pub fn new(sink: ResultSink<W>, progress: ProgressReporter) -> Self {
        Self {
            sink,
            counters: Counters::default(),
            progress,
        }
    }

    /// Persist one outcome, bump counters, report if due.
    pub fn record(&mut self, outcome: &Outcome) -> Result<(), NoteDispatchError> {
        self.sink.record(outcome)?;
        self.counters.observe(outcome);
        if self.progress.observe(self.counters).is_some() {
            // Keep the files roughly in step with what the log claims.
            self.sink.flush()?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn counters(&self) -> Counters {
        self.counters
    }

    pub fn finish(self) -> Result<(Counters, Duration, (W, W)), NoteDispatchError> {
        let elapsed = self.progress.elapsed();
        let writers = self.sink.finish()?;
        Ok((self.counters, elapsed, writers))
    }
}

/// What a finished run reports back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub counters: Counters,
    pub elapsed: Duration,
    pub out_success: PathBuf,
    pub out_failed: PathBuf,
}

/// Read the input, dispatch every record, and write both outputs.
/// Returns `Ok(None)` when the input has no rows (no outputs are created).
pub async fn execute(
    settings: &DispatchSettings,
    transport: Arc<dyn Transport>,
) -> Result<Option<RunSummary>, NoteDispatchError> {
    let table = input::load(&settings.input)?;
    if table.records.is_empty() {
        tracing::warn!(path = %settings.input.display(), "no rows found in input");
        return Ok(None);
    }
    let expected = table.records.len();

    let sink = ResultSink::create(&settings.out_success, &settings.out_failed)?;
    let mut context = RunContext::new(sink, ProgressReporter::new(expected, settings.progress_every));

    let dispatcher = Dispatcher::new(
        RequestExecutor::new(transport, settings.retry_policy()),
        settings.concurrency,
    );

    tracing::info!(
        records = expected,
        concurrency = dispatcher.concurrency(),
        retries = settings.retries,
        "dispatch started"
    );

    dispatcher
        .run(table.records, |outcome| context.record(&outcome))
        .await?;

    let (counters, elapsed, _) = context.finish()?;
    Ok(Some(RunSummary {
        counters,
        elapsed,
        out_success: settings.out_success.clone(),
        out_failed: settings.out_failed.clone(),
    }))
}
