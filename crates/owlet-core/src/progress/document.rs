//! Typed view of the remote progress document.
//!
//! The wire format is JSON, but everything past the store boundary works on
//! [`FieldValue`] so the resolver never runtime-casts `serde_json::Value`.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Field holding the per-unit stage completion mappings.
pub const FIELD_UNIT_STAGE_STATUS: &str = "unit_stage_btn_status";

/// Field holding the date after which the next unit opens.
pub const FIELD_NEXT_UNIT_DATE: &str = "next_unit_date";

/// A document node: scalar or nested mapping, arbitrary depth.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(f64),
    Map(HashMap<String, FieldValue>),
}

/// A wire value the document schema has no place for (array or null).
#[derive(Debug, Error)]
#[error("unsupported {kind} value at '{path}'")]
pub struct DecodeError {
    path: String,
    kind: &'static str,
}

impl FieldValue {
    /// Decode a JSON node. Arrays and nulls are schema violations.
    pub fn from_json(value: &Value) -> Result<FieldValue, DecodeError> {
        Self::decode(value, "$")
    }

    fn decode(value: &Value, path: &str) -> Result<FieldValue, DecodeError> {
        match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Bool(b) => Ok(FieldValue::Flag(*b)),
            Value::Number(n) => Ok(FieldValue::Number(n.as_f64().unwrap_or(0.0))),
            Value::Object(map) => {
                let mut fields = HashMap::with_capacity(map.len());
                for (key, node) in map {
                    let child = Self::decode(node, &format!("{path}.{key}"))?;
                    fields.insert(key.clone(), child);
                }
                Ok(FieldValue::Map(fields))
            }
            Value::Array(_) => Err(DecodeError {
                path: path.to_string(),
                kind: "array",
            }),
            Value::Null => Err(DecodeError {
                path: path.to_string(),
                kind: "null",
            }),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, FieldValue>> {
        match self {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Immutable snapshot of one learner's progress record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDocument {
    fields: HashMap<String, FieldValue>,
}

impl ProgressDocument {
    /// Decode the raw document. The root must be a mapping.
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        match FieldValue::from_json(raw)? {
            FieldValue::Map(fields) => Ok(Self { fields }),
            _ => Err(DecodeError {
                path: "$".to_string(),
                kind: "non-mapping root",
            }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Stage completion flags for one unit. `None` when the unit has no
    /// entry at all; non-flag entries inside the unit are ignored.
    pub fn unit_status(&self, unit_key: &str) -> Option<UnitStatusMap> {
        let units = self.get(FIELD_UNIT_STAGE_STATUS)?.as_map()?;
        let unit = units.get(unit_key)?.as_map()?;
        Some(
            unit.iter()
                .filter_map(|(stage, value)| value.as_flag().map(|played| (stage.clone(), played)))
                .collect(),
        )
    }

    /// Raw `next_unit_date` field, if present.
    pub fn next_unit_date(&self) -> Option<&str> {
        self.get_text(FIELD_NEXT_UNIT_DATE)
    }
}

/// Per-unit mapping from lower-case stage key to "played" flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitStatusMap {
    stages: HashMap<String, bool>,
}

impl UnitStatusMap {
    pub fn played(&self, stage: &str) -> Option<bool> {
        self.stages.get(stage).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

impl FromIterator<(String, bool)> for UnitStatusMap {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

/// Path to one remote document: collection/document/subcollection/subdocument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    collection: String,
    document: String,
    subcollection: String,
    subdocument: String,
}

impl DocPath {
    pub fn new(
        collection: impl Into<String>,
        document: impl Into<String>,
        subcollection: impl Into<String>,
        subdocument: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
            subcollection: subcollection.into(),
            subdocument: subdocument.into(),
        }
    }

    pub fn segments(&self) -> [&str; 4] {
        [
            &self.collection,
            &self.document,
            &self.subcollection,
            &self.subdocument,
        ]
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> ProgressDocument {
        ProgressDocument::decode(&json!({
            "display_name": "Mika",
            "total_xp": 120,
            "next_unit_date": "2024-05-01",
            "unit_stage_btn_status": {
                "unit01": {"lesson": true, "video": true, "quiz": false},
                "unit02": {}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_nested_document() {
        let doc = sample_doc();
        assert_eq!(doc.get_text("display_name"), Some("Mika"));
        assert_eq!(doc.next_unit_date(), Some("2024-05-01"));

        let unit01 = doc.unit_status("unit01").unwrap();
        assert_eq!(unit01.played("lesson"), Some(true));
        assert_eq!(unit01.played("quiz"), Some(false));
        assert_eq!(unit01.played("flashcard"), None);
    }

    #[test]
    fn test_absent_and_empty_units() {
        let doc = sample_doc();
        assert!(doc.unit_status("unit03").is_none());

        let unit02 = doc.unit_status("unit02").unwrap();
        assert!(unit02.is_empty());
    }

    #[test]
    fn test_non_flag_stage_entries_are_ignored() {
        let doc = ProgressDocument::decode(&json!({
            "unit_stage_btn_status": {
                "unit01": {"lesson": true, "note": "half done"}
            }
        }))
        .unwrap();

        let unit01 = doc.unit_status("unit01").unwrap();
        assert_eq!(unit01.len(), 1);
        assert_eq!(unit01.played("note"), None);
    }

    #[test]
    fn test_arrays_and_nulls_are_rejected() {
        assert!(ProgressDocument::decode(&json!({"stages": ["lesson"]})).is_err());
        assert!(ProgressDocument::decode(&json!({"next_unit_date": null})).is_err());
        assert!(ProgressDocument::decode(&json!("just a string")).is_err());
    }

    #[test]
    fn test_doc_path_display() {
        let path = DocPath::new("learners", "abc123", "progress", "main");
        assert_eq!(path.to_string(), "learners/abc123/progress/main");
    }
}
