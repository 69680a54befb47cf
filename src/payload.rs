//! Record model and the record → request payload transform.
//!
//! [`Record`] is one trimmed input row. [`build_payload`] maps it onto the
//! fixed note-submission body. Field order is fixed by the struct layout,
//! so serializing the same record twice yields identical bytes.

use bytes::Bytes;
use serde::Serialize;

/// One input row. All fields are trimmed; absent columns are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub external_id: String,
    pub visible_id: String,
    pub note_text: String,
}

impl Record {
    #[must_use]
    pub fn new(external_id: &str, visible_id: &str, note_text: &str) -> Self {
        Self {
            external_id: external_id.trim().to_string(),
            visible_id: visible_id.trim().to_string(),
            note_text: note_text.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub member_id_type: &'static str,
    pub note_definition_visible_id: String,
    pub note_type: &'static str,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub member_id: String,
    pub note_fields: Vec<serde_json::Value>,
    pub note_text: String,
}

impl Payload {
    /// Serialized request body. Built once per record and resent unchanged.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        // Only string and empty-array fields: serialization cannot fail.
        serde_json::to_vec(self).map_or_else(|_| Bytes::new(), Bytes::from)
    }
}

#[must_use]
pub fn build_payload(record: &Record) -> Payload {
    Payload {
        member_id_type: "External",
        note_definition_visible_id: record.visible_id.clone(),
        note_type: "admin",
        notes: vec![Note {
            member_id: record.external_id.clone(),
            note_fields: Vec::new(),
            note_text: record.note_text.clone(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fields_are_trimmed() {
        let record = Record::new("  EXT1 ", "\tNOTE-DEF\n", "  hello world  ");
        assert_eq!(record.external_id, "EXT1");
        assert_eq!(record.visible_id, "NOTE-DEF");
        assert_eq!(record.note_text, "hello world");
    }

    #[test]
    fn payload_has_fixed_shape() {
        let record = Record::new("EXT1", "VIS1", "called member");
        let value: serde_json::Value =
            serde_json::from_slice(&build_payload(&record).to_bytes()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "memberIdType": "External",
                "noteDefinitionVisibleId": "VIS1",
                "noteType": "admin",
                "notes": [{
                    "memberId": "EXT1",
                    "noteFields": [],
                    "noteText": "called member",
                }],
            })
        );
    }

    #[test]
    fn payload_bytes_are_stable_across_builds() {
        let record = Record::new("EXT9", "VIS9", "line \"quoted\" \u{e9}");
        let first = build_payload(&record).to_bytes();
        let second = build_payload(&record).to_bytes();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_record_still_builds() {
        let body = build_payload(&Record::default()).to_bytes();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with(r#"{"memberIdType":"External","noteDefinitionVisibleId":"""#));
    }
}
