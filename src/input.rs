//! CSV input reader.
//!
//! Columns are matched by header name (`ExternalMemberID`, `VisibleID`,
//! `NoteText`); a missing column or a short row yields empty strings.
//! A UTF-8 byte-order mark in front of the first header is ignored.

use std::io::Read;
use std::path::Path;

use crate::error::NoteDispatchError;
use crate::payload::Record;

pub const EXTERNAL_ID_COLUMN: &str = "ExternalMemberID";
pub const VISIBLE_ID_COLUMN: &str = "VisibleID";
pub const NOTE_TEXT_COLUMN: &str = "NoteText";

/// Parsed input plus the expected columns absent from the header.
#[derive(Debug, Default)]
pub struct InputTable {
    pub records: Vec<Record>,
    pub missing_columns: Vec<&'static str>,
}

struct ColumnMap {
    external_id: Option<usize>,
    visible_id: Option<usize>,
    note_text: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == name)
        };
        Self {
            external_id: position(EXTERNAL_ID_COLUMN),
            visible_id: position(VISIBLE_ID_COLUMN),
            note_text: position(NOTE_TEXT_COLUMN),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            (self.external_id, EXTERNAL_ID_COLUMN),
            (self.visible_id, VISIBLE_ID_COLUMN),
            (self.note_text, NOTE_TEXT_COLUMN),
        ]
        .into_iter()
        .filter_map(|(idx, name)| idx.is_none().then_some(name))
        .collect()
    }

    fn record(&self, row: &csv::StringRecord) -> Record {
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");
        Record::new(
            field(self.external_id),
            field(self.visible_id),
            field(self.note_text),
        )
    }
}

pub fn read_records<R: Read>(reader: R) -> Result<InputTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(csv_reader.headers()?);
    let mut records = Vec::new();
    for row in csv_reader.records() {
        records.push(columns.record(&row?));
    }

    Ok(InputTable {
        records,
        missing_columns: columns.missing(),
    })
}

pub fn load(path: &Path) -> Result<InputTable, NoteDispatchError> {
    if !path.exists() {
        return Err(NoteDispatchError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    let table = read_records(file).map_err(|source| NoteDispatchError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    if !table.missing_columns.is_empty() {
        tracing::warn!(
            path = %path.display(),
            missing = ?table.missing_columns,
            "input is missing expected columns, using empty values"
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> InputTable {
        read_records(text.as_bytes()).unwrap()
    }

    #[test]
    fn reads_columns_by_name() {
        let table = parse("NoteText,ExternalMemberID,VisibleID\nhello , EXT1 ,VIS1\n");
        assert_eq!(table.records, vec![Record::new("EXT1", "VIS1", "hello")]);
        assert!(table.missing_columns.is_empty());
    }

    #[test]
    fn missing_column_defaults_to_empty() {
        let table = parse("ExternalMemberID,NoteText\nEXT1,note\n");
        assert_eq!(table.records[0].visible_id, "");
        assert_eq!(table.missing_columns, vec![VISIBLE_ID_COLUMN]);
    }

    #[test]
    fn short_rows_default_to_empty() {
        let table = parse("ExternalMemberID,VisibleID,NoteText\nEXT1\nEXT2,VIS2,note\n");
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0], Record::new("EXT1", "", ""));
        assert_eq!(table.records[1], Record::new("EXT2", "VIS2", "note"));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let table = parse("\u{feff}ExternalMemberID,VisibleID,NoteText\nEXT1,VIS1,n\n");
        assert!(table.missing_columns.is_empty());
        assert_eq!(table.records[0].external_id, "EXT1");
    }

    #[test]
    fn quoted_fields_keep_commas_and_newlines() {
        let table = parse("ExternalMemberID,VisibleID,NoteText\nEXT1,VIS1,\"a, b\nc\"\n");
        assert_eq!(table.records[0].note_text, "a, b\nc");
    }

    #[test]
    fn header_only_input_has_no_records() {
        let table = parse("ExternalMemberID,VisibleID,NoteText\n");
        assert!(table.records.is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, NoteDispatchError::InputNotFound { .. }));
    }
}
