//! `note-dispatch run`: submit every input row.
//!
//! Initialises logging, resolves and validates settings, builds the
//! HTTP transport, then hands off to [`pipeline::execute`]. Prints a
//! final summary with both output paths.

use std::sync::Arc;

use tracing::Instrument;

use crate::cli::RunArgs;
use crate::client::HyperTransport;
use crate::config::DispatchSettings;
use crate::error::NoteDispatchError;
use crate::logging;
use crate::pipeline;

pub async fn execute(args: RunArgs) -> Result<(), NoteDispatchError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let settings = DispatchSettings::from_args(&args)?;
    let transport = HyperTransport::new(
        &settings.url,
        settings.token.as_deref(),
        settings.verify_tls,
        settings.concurrency,
    )?;

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", run_id = %run_id);

    tracing::info!(
        parent: &span,
        input = %settings.input.display(),
        url = %settings.url,
        concurrency = settings.concurrency,
        timeout_secs = settings.attempt_timeout.as_secs(),
        retries = settings.retries,
        backoff_secs = settings.backoff_base.as_secs_f64(),
        authenticated = settings.token.is_some(),
        verify_tls = settings.verify_tls,
        "note-dispatch starting"
    );

    let summary = pipeline::execute(&settings, Arc::new(transport))
        .instrument(span.clone())
        .await?;

    let Some(summary) = summary else {
        println!("No rows found in {}.", settings.input.display());
        return Ok(());
    };

    tracing::info!(
        parent: &span,
        total = summary.counters.total,
        ok = summary.counters.succeeded,
        failed = summary.counters.failed,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "note-dispatch finished"
    );

    println!("\nDONE");
    println!(
        "total={} ok={} fail={} time={:.1}s",
        summary.counters.total,
        summary.counters.succeeded,
        summary.counters.failed,
        summary.elapsed.as_secs_f64()
    );
    println!("success file: {}", summary.out_success.display());
    println!("failed file : {}", summary.out_failed.display());
    Ok(())
}
