//! Resolved run settings.
//!
//! [`DispatchSettings`] is built from the parsed `run` flags by
//! [`DispatchSettings::from_args`], which runs [`validation::validate`]
//! first so every later stage can trust the values (non-zero
//! concurrency, http(s) URL, finite backoff).

pub mod validation;

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::dispatch::RetryPolicy;
use crate::error::NoteDispatchError;

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub input: PathBuf,
    pub url: String,
    pub token: Option<String>,
    pub out_success: PathBuf,
    pub out_failed: PathBuf,
    pub concurrency: usize,
    pub retries: u32,
    pub backoff_base: Duration,
    pub attempt_timeout: Duration,
    pub progress_every: usize,
    pub verify_tls: bool,
}

impl DispatchSettings {
    pub fn from_args(args: &RunArgs) -> Result<Self, NoteDispatchError> {
        validation::validate(args)
            .map_err(|errors| NoteDispatchError::SettingsValidation { errors })?;

        Ok(Self {
            input: args.input.clone(),
            url: args.url.trim().to_string(),
            token: args
                .token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
            out_success: args.out_success.clone(),
            out_failed: args.out_failed.clone(),
            concurrency: args.concurrency,
            retries: args.retries,
            backoff_base: Duration::from_secs_f64(args.backoff),
            attempt_timeout: Duration::from_secs(args.timeout),
            progress_every: args.progress_every,
            verify_tls: !args.insecure,
        })
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff_base: self.backoff_base,
            attempt_timeout: self.attempt_timeout,
        }
    }
}
