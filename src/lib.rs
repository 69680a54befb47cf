//! note-dispatch submits one HTTP note per CSV row.
//!
//! Each row of the input file becomes a JSON POST to a single endpoint.
//! Requests run with bounded concurrency, transient failures are retried
//! with exponential backoff and jitter, and every row ends up in exactly
//! one of two output CSVs: one for successes, one for failures.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, init).
//! - [`config`] -- Resolved run settings and their validation.
//! - [`input`] -- CSV reader mapping header names onto [`payload::Record`]s.
//! - [`payload`] -- Record model and the record to request body transform.
//! - [`client`] -- The [`Transport`](client::Transport) seam and its hyper
//!   implementation with optional TLS verification.
//! - [`dispatch`] -- Response classification, the per-record retry state
//!   machine, and the bounded-concurrency dispatcher.
//! - [`sink`] -- The success and failure CSV writers.
//! - [`progress`] -- Counters and periodic rate/ETA reporting.
//! - [`pipeline`] -- One complete run wiring input, dispatcher and sinks.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod client;
pub mod cmd;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod logging;
pub mod payload;
pub mod pipeline;
pub mod progress;
pub mod sink;
