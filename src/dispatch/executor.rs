//! Per-record attempt/retry/backoff state machine.
//!
//! [`RetryMachine`] is the pure half: it holds an [`ExecState`] and moves
//! it forward from observed [`Attempt`]s, with no clock and no network.
//! [`RequestExecutor`] is the driver: it performs the attempt or sleeps
//! the backoff the current state asks for, then feeds the result back.
//!
//! ```text
//! Attempting(0) ──retryable, n < retries──▶ BackingOff(0) ──▶ Attempting(1) ──▶ …
//!      │                                                           │
//!      ├──2xx, no success=false──▶ Succeeded                       │
//!      └──other non-2xx / success=false / retries exhausted──▶ FailedTerminal
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use tokio::time::Instant;

use super::classify::classify;
use super::outcome::Outcome;
use crate::client::{RawResponse, Transport};
use crate::error::TransportError;
use crate::payload::{build_payload, Record};

/// Statuses that are retried with backoff instead of failing the record.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Upper bound (exclusive) of the random delay added to each backoff.
pub const MAX_JITTER: Duration = Duration::from_millis(250);

/// Response bodies are cut to this many characters in error messages.
pub const BODY_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub backoff_base: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_base: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// `backoff_base * 2^n`, saturating instead of overflowing.
    #[must_use]
    pub fn base_delay(&self, failed_attempt: u32) -> Duration {
        1u32.checked_shl(failed_attempt)
            .map_or(Duration::MAX, |factor| self.backoff_base.saturating_mul(factor))
    }

    /// Delay slept before the attempt following `failed_attempt`.
    #[must_use]
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        self.base_delay(failed_attempt).saturating_add(jitter())
    }
}

fn jitter() -> Duration {
    let max_nanos = u64::try_from(MAX_JITTER.as_nanos()).unwrap_or(u64::MAX);
    Duration::from_nanos(rand::rng().random_range(0..max_nanos))
}

/// One call against the endpoint and what came back.
#[derive(Debug)]
pub struct Attempt {
    pub index: u32,
    pub elapsed: Duration,
    pub result: Result<RawResponse, TransportError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecState {
    /// Attempt `n` (0-based) is due.
    Attempting(u32),
    /// Attempt `n` failed transiently; sleep, then attempt `n + 1`.
    BackingOff(u32),
    Succeeded(Outcome),
    FailedTerminal(Outcome),
}

impl ExecState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::FailedTerminal(_))
    }
}

#[must_use]
pub fn is_retryable(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

fn as_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug)]
pub struct RetryMachine {
    external_id: String,
    retries: u32,
    state: ExecState,
    last_error: Option<String>,
}

impl RetryMachine {
    #[must_use]
    pub fn new(external_id: &str, retries: u32) -> Self {
        Self {
            external_id: external_id.to_string(),
            retries,
            state: ExecState::Attempting(0),
            last_error: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ExecState {
        &self.state
    }

    /// Feed the result of the attempt the machine is waiting on.
    pub fn observe(&mut self, attempt: Attempt) {
        let ExecState::Attempting(n) = self.state else {
            tracing::warn!(
                external_id = %self.external_id,
                state = ?self.state,
                "attempt observed outside Attempting state, ignoring"
            );
            return;
        };
        if attempt.index != n {
            tracing::warn!(
                external_id = %self.external_id,
                expected = n,
                got = attempt.index,
                "attempt index mismatch"
            );
        }

        let elapsed_ms = as_millis(attempt.elapsed);
        self.state = match attempt.result {
            Err(e) => self.retry_or_fail(n, None, None, e.to_string()),
            Ok(response) if is_retryable(response.status) => {
                let error = format!("HTTP {} body={}", response.status, excerpt(&response.body));
                self.retry_or_fail(n, Some(response.status), Some(elapsed_ms), error)
            }
            Ok(response) if !(200..300).contains(&response.status) => {
                ExecState::FailedTerminal(Outcome::failure(
                    &self.external_id,
                    Some(response.status),
                    Some(elapsed_ms),
                    String::new(),
                    format!("HTTP {} body={}", response.status, excerpt(&response.body)),
                ))
            }
            Ok(response) => {
                let classification = classify(&response.body, &self.external_id);
                if classification.explicit_failure {
                    ExecState::FailedTerminal(Outcome::failure(
                        &self.external_id,
                        Some(response.status),
                        Some(elapsed_ms),
                        classification.returned_id,
                        format!("success=false body={}", excerpt(&response.body)),
                    ))
                } else {
                    ExecState::Succeeded(Outcome::success(
                        &self.external_id,
                        response.status,
                        elapsed_ms,
                        classification.returned_id,
                    ))
                }
            }
        };
    }

    fn retry_or_fail(
        &mut self,
        n: u32,
        status: Option<u16>,
        elapsed_ms: Option<u64>,
        error: String,
    ) -> ExecState {
        if n < self.retries {
            self.last_error = Some(error);
            ExecState::BackingOff(n)
        } else {
            ExecState::FailedTerminal(Outcome::failure(
                &self.external_id,
                status,
                elapsed_ms,
                String::new(),
                error,
            ))
        }
    }

    /// Leave `BackingOff(n)` once the delay has elapsed.
    pub fn resume(&mut self) {
        let ExecState::BackingOff(n) = self.state else {
            return;
        };
        self.state = if n < self.retries {
            ExecState::Attempting(n + 1)
        } else {
            ExecState::FailedTerminal(self.unknown_failure())
        };
    }

    fn unknown_failure(&self) -> Outcome {
        Outcome::failure(
            &self.external_id,
            None,
            None,
            String::new(),
            self.last_error
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
        )
    }

    /// Terminal outcome; a machine stopped early yields a failure.
    #[must_use]
    pub fn finish(self) -> Outcome {
        match self.state {
            ExecState::Succeeded(outcome) | ExecState::FailedTerminal(outcome) => outcome,
            ExecState::Attempting(_) | ExecState::BackingOff(_) => self.unknown_failure(),
        }
    }
}

enum Step {
    Attempt(u32),
    Backoff(u32),
}

/// Drives one record's [`RetryMachine`] against a [`Transport`].
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub async fn execute(&self, record: &Record) -> Outcome {
        let body = build_payload(record).to_bytes();
        let mut machine = RetryMachine::new(&record.external_id, self.policy.retries);

        loop {
            let step = match machine.state() {
                ExecState::Attempting(n) => Step::Attempt(*n),
                ExecState::BackingOff(n) => Step::Backoff(*n),
                ExecState::Succeeded(_) | ExecState::FailedTerminal(_) => break,
            };
            match step {
                Step::Attempt(n) => {
                    let attempt = self.attempt(n, body.clone()).await;
                    machine.observe(attempt);
                }
                Step::Backoff(n) => {
                    let delay = self.policy.backoff_delay(n);
                    tracing::warn!(
                        external_id = %record.external_id,
                        attempt = n + 1,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = as_millis(delay),
                        "transient failure, backing off"
                    );
                    // The concurrency permit stays held while sleeping.
                    tokio::time::sleep(delay).await;
                    machine.resume();
                }
            }
        }

        let outcome = machine.finish();
        if outcome.ok {
            tracing::debug!(
                external_id = %outcome.external_id,
                status = outcome.status.unwrap_or(0),
                returned_id = %outcome.returned_id,
                "record submitted"
            );
        } else {
            tracing::warn!(
                external_id = %outcome.external_id,
                status = outcome.status.unwrap_or(0),
                error = %outcome.error,
                "record failed"
            );
        }
        outcome
    }

    async fn attempt(&self, index: u32, body: Bytes) -> Attempt {
        let start = Instant::now();
        let timeout = self.policy.attempt_timeout;
        let result = match tokio::time::timeout(timeout, self.transport.post(body)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };
        Attempt {
            index,
            elapsed: start.elapsed(),
            result,
        }
    }
}
