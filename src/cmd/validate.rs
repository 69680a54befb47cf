//! `note-dispatch validate`: check an input file without sending anything.
//!
//! Reads the CSV the same way `run` does and reports row counts, blank
//! fields, and missing columns in either human-readable text or
//! machine-readable JSON. Rows without an `ExternalMemberID` fail the
//! check, since the endpoint has nothing to attach the note to.

use std::path::Path;

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::error::{NoteDispatchError, ValidationError};
use crate::input::{self, InputTable};
use crate::payload::{build_payload, Record};

/// Summary of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputReport {
    pub rows: usize,
    pub blank_external_id: usize,
    pub blank_visible_id: usize,
    pub blank_note_text: usize,
    pub missing_columns: Vec<&'static str>,
}

impl InputReport {
    #[must_use]
    pub fn inspect(table: &InputTable) -> Self {
        let count = |blank: fn(&Record) -> bool| table.records.iter().filter(|r| blank(r)).count();
        Self {
            rows: table.records.len(),
            blank_external_id: count(|r| r.external_id.is_empty()),
            blank_visible_id: count(|r| r.visible_id.is_empty()),
            blank_note_text: count(|r| r.note_text.is_empty()),
            missing_columns: table.missing_columns.clone(),
        }
    }
}

/// One error per row lacking an `ExternalMemberID`. Data rows are
/// numbered from 1; a quoted field may span several file lines.
#[must_use]
pub fn row_errors(table: &InputTable) -> Vec<ValidationError> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.external_id.is_empty())
        .map(|(i, _)| ValidationError {
            field: format!("row {}", i + 1),
            message: format!("{} is empty", input::EXTERNAL_ID_COLUMN),
            suggestion: None,
        })
        .collect()
}

pub fn execute(args: &ValidateArgs) -> Result<(), NoteDispatchError> {
    let path = &args.input;
    let table = input::load(path)?;
    let report = InputReport::inspect(&table);
    let errors = row_errors(&table);

    match args.format {
        ValidateFormat::Text => print_text(path, &report, &errors),
        ValidateFormat::Json => {
            let json_errors: Vec<serde_json::Value> = errors
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "field": e.field,
                        "message": e.message,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "valid": errors.is_empty(),
                    "report": report,
                    "errors": json_errors,
                })
            );
        }
    }

    if args.show_payload {
        if let Some(first) = table.records.first() {
            let body = serde_json::to_string_pretty(&build_payload(first))
                .unwrap_or_else(|e| format!("<unserializable: {e}>"));
            println!("\nFirst request body:\n{body}");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(NoteDispatchError::InputValidation(errors.len()))
    }
}

fn print_text(path: &Path, report: &InputReport, errors: &[ValidationError]) {
    if errors.is_empty() {
        println!("\u{2713} {}: {} rows", path.display(), report.rows);
    } else {
        eprintln!(
            "\u{2717} {} has {} rows without {}\n",
            path.display(),
            errors.len(),
            input::EXTERNAL_ID_COLUMN
        );
        for error in errors {
            eprintln!("{error}");
        }
        eprintln!();
    }
    if !report.missing_columns.is_empty() {
        println!("  missing columns: {}", report.missing_columns.join(", "));
    }
    if report.blank_visible_id > 0 {
        println!(
            "  {} rows with empty {}",
            report.blank_visible_id,
            input::VISIBLE_ID_COLUMN
        );
    }
    if report.blank_note_text > 0 {
        println!(
            "  {} rows with empty {}",
            report.blank_note_text,
            input::NOTE_TEXT_COLUMN
        );
    }
}
