//! Unified error types for note-dispatch.
//!
//! [`NoteDispatchError`] covers run-level failures that abort the whole
//! invocation (missing input, unwritable outputs, bad settings).
//! [`TransportError`] covers a single failed attempt and never escapes
//! the executor: it is folded into the record's failure outcome.
//! [`ValidationError`] describes one rejected setting with a hint.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum NoteDispatchError {
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to read input {}:\n  {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Cannot create output {}:\n  {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output row: {0}")]
    OutputWrite(#[from] csv::Error),

    #[error("Invalid settings:\n{}", format_errors(.errors))]
    SettingsValidation { errors: Vec<ValidationError> },

    #[error("Input validation failed: {0} rows have no ExternalMemberID")]
    InputValidation(usize),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {} (pass --force to overwrite)", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bearer token: {0}")]
    InvalidToken(#[from] http::header::InvalidHeaderValue),
}

/// Why a single attempt produced no HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("timeout: no response within {0:?}")]
    Timeout(std::time::Duration),

    #[error("request: {0}")]
    Request(String),

    #[error("body: {0}")]
    Body(String),
}
