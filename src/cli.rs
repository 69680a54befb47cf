//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, init), and their associated argument
//! structs. Every `run` flag has an environment variable equivalent
//! so batch jobs can be configured without a long command line.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "note-dispatch",
    version,
    about = "Submit member notes from a CSV file to an HTTP endpoint",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        note-dispatch init                                  Write a template notes.csv\n  \
        note-dispatch validate notes.csv                    Check the input offline\n  \
        note-dispatch run -i notes.csv -u https://api/notes Submit every row"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit every input row to the endpoint
    Run(Box<RunArgs>),

    /// Check an input file without sending anything
    Validate(ValidateArgs),

    /// Write a template input file
    Init(InitArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        note-dispatch run -i notes.csv -u https://host/api/notes\n  \
        note-dispatch run -i notes.csv -u https://host/api/notes -c 20 --retries 4\n  \
        note-dispatch run -i notes.csv -u https://localhost:8443/notes --insecure --pretty")]
pub struct RunArgs {
    /// Input CSV (columns: ExternalMemberID, VisibleID, NoteText)
    #[arg(short, long, env = "NOTE_DISPATCH_INPUT")]
    pub input: PathBuf,

    /// Endpoint URL every row is POSTed to
    #[arg(short, long, env = "NOTE_DISPATCH_URL")]
    pub url: String,

    /// Bearer token sent in the Authorization header
    #[arg(long, env = "NOTE_DISPATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    // -- Outputs --
    /// CSV receiving successful rows
    #[arg(
        long,
        env = "NOTE_DISPATCH_OUT_SUCCESS",
        default_value = "success.csv",
        help_heading = "Outputs"
    )]
    pub out_success: PathBuf,

    /// CSV receiving failed rows
    #[arg(
        long,
        env = "NOTE_DISPATCH_OUT_FAILED",
        default_value = "failed.csv",
        help_heading = "Outputs"
    )]
    pub out_failed: PathBuf,

    // -- Tuning --
    /// Records in flight at once (including their retries)
    #[arg(
        short,
        long,
        env = "NOTE_DISPATCH_CONCURRENCY",
        default_value_t = 10,
        help_heading = "Tuning"
    )]
    pub concurrency: usize,

    /// Per-attempt timeout in seconds
    #[arg(
        long,
        env = "NOTE_DISPATCH_TIMEOUT_SECS",
        default_value_t = 60,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Retries for transient errors (timeouts, 408, 429, 5xx gateway errors)
    #[arg(
        long,
        env = "NOTE_DISPATCH_RETRIES",
        default_value_t = 2,
        help_heading = "Tuning"
    )]
    pub retries: u32,

    /// Backoff base in seconds; attempt n waits base * 2^n plus jitter
    #[arg(
        long,
        env = "NOTE_DISPATCH_BACKOFF_SECS",
        default_value_t = 0.5,
        help_heading = "Tuning"
    )]
    pub backoff: f64,

    /// Log a progress summary every N completed rows
    #[arg(
        long,
        env = "NOTE_DISPATCH_PROGRESS_EVERY",
        default_value_t = 50,
        help_heading = "Tuning"
    )]
    pub progress_every: usize,

    /// Disable TLS certificate verification (TEST ONLY)
    #[arg(long, env = "NOTE_DISPATCH_INSECURE")]
    pub insecure: bool,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input CSV to check
    #[arg(default_value = "notes.csv")]
    pub input: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,

    /// Print the request body built from the first row
    #[arg(long)]
    pub show_payload: bool,
}

#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "notes.csv")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
