//! Validation of `run` flags with detailed error reporting.
//!
//! The [`validate`] function checks the parsed [`RunArgs`] for values
//! that would make the run meaningless or unsafe: a non-http(s) URL,
//! zero or huge concurrency, a zero timeout, a negative or non-finite backoff,
//! identical output paths. Returns every problem at once, each as a
//! [`ValidationError`] with an optional suggestion.

use url::Url;

use crate::cli::RunArgs;
use crate::error::ValidationError;

/// Largest backoff base accepted, in seconds.
pub const MAX_BACKOFF_SECS: f64 = 3600.0;

/// Most records allowed in flight at once.
pub const MAX_CONCURRENCY: usize = 10_000;

/// Validate the endpoint URL. Returns `Ok(())` or a human-readable error.
pub fn validate_url(url: &str) -> Result<(), String> {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().map_or(true, str::is_empty) {
                Err(format!("'{url}' has no host"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Validate the backoff base in seconds.
pub fn validate_backoff(secs: f64) -> Result<(), String> {
    if !secs.is_finite() {
        return Err("backoff must be a finite number of seconds".into());
    }
    if secs < 0.0 {
        return Err(format!("backoff cannot be negative (got {secs})"));
    }
    if secs > MAX_BACKOFF_SECS {
        return Err(format!("backoff of {secs}s exceeds {MAX_BACKOFF_SECS}s"));
    }
    Ok(())
}

fn error(field: &str, message: impl Into<String>, suggestion: Option<String>) -> ValidationError {
    ValidationError {
        field: field.into(),
        message: message.into(),
        suggestion,
    }
}

pub fn validate(args: &RunArgs) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(msg) = validate_url(&args.url) {
        let suggestion = (!args.url.contains("://"))
            .then(|| format!("did you mean 'https://{}'?", args.url.trim()));
        errors.push(error("url", msg, suggestion));
    }

    if args.concurrency == 0 {
        errors.push(error(
            "concurrency",
            "must be at least 1",
            Some("use --concurrency 1 for sequential submission".into()),
        ));
    } else if args.concurrency > MAX_CONCURRENCY {
        errors.push(error(
            "concurrency",
            format!(
                "{} exceeds the limit of {MAX_CONCURRENCY}",
                args.concurrency
            ),
            Some(format!("use --concurrency {MAX_CONCURRENCY} or less")),
        ));
    }

    if args.timeout == 0 {
        errors.push(error("timeout", "must be at least 1 second", None));
    }

    if let Err(msg) = validate_backoff(args.backoff) {
        errors.push(error("backoff", msg, None));
    }

    if args.progress_every == 0 {
        errors.push(error("progress-every", "must be at least 1", None));
    }

    if args.out_success == args.out_failed {
        errors.push(error(
            "out-failed",
            format!(
                "same path as --out-success ({})",
                args.out_success.display()
            ),
            Some("give failures their own file".into()),
        ));
    }

    if args.input == args.out_success || args.input == args.out_failed {
        errors.push(error(
            "input",
            "input file would be overwritten by an output file",
            None,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cli::LogLevel;

    fn minimal_args() -> RunArgs {
        RunArgs {
            input: PathBuf::from("notes.csv"),
            url: "https://api.example.com/notes".into(),
            token: None,
            out_success: PathBuf::from("success.csv"),
            out_failed: PathBuf::from("failed.csv"),
            concurrency: 10,
            timeout: 60,
            retries: 2,
            backoff: 0.5,
            progress_every: 50,
            insecure: false,
            log_level: LogLevel::Info,
            pretty: false,
            json: false,
        }
    }

    #[test]
    fn valid_args_pass() {
        assert!(validate(&minimal_args()).is_ok());
    }

    #[test]
    fn url_without_scheme_gets_suggestion() {
        let args = RunArgs {
            url: "api.example.com/notes".into(),
            ..minimal_args()
        };
        let errors = validate(&args).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean 'https://api.example.com/notes'?")
        );
    }

    #[test]
    fn non_http_scheme_fails() {
        let err = validate_url("ftp://example.com/notes").unwrap_err();
        assert!(err.contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn zero_concurrency_fails() {
        let args = RunArgs {
            concurrency: 0,
            ..minimal_args()
        };
        let errors = validate(&args).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "concurrency"));
    }

    #[test]
    fn oversized_concurrency_fails() {
        let args = RunArgs {
            concurrency: 4_611_686_018_427_387_903,
            ..minimal_args()
        };
        let errors = validate(&args).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "concurrency");
        assert!(errors[0].suggestion.is_some());

        let at_limit = RunArgs {
            concurrency: MAX_CONCURRENCY,
            ..minimal_args()
        };
        assert!(validate(&at_limit).is_ok());
    }

    #[test]
    fn bad_backoff_values_fail() {
        assert!(validate_backoff(-0.1).is_err());
        assert!(validate_backoff(f64::NAN).is_err());
        assert!(validate_backoff(f64::INFINITY).is_err());
        assert!(validate_backoff(0.0).is_ok());
    }

    #[test]
    fn same_output_paths_fail() {
        let args = RunArgs {
            out_failed: PathBuf::from("success.csv"),
            ..minimal_args()
        };
        let errors = validate(&args).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "out-failed"));
    }

    #[test]
    fn all_problems_reported_together() {
        let args = RunArgs {
            url: "nope".into(),
            concurrency: 0,
            timeout: 0,
            progress_every: 0,
            ..minimal_args()
        };
        let errors = validate(&args).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
