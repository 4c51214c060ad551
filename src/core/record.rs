//! Schemaless record backed by a JSON object
//!
//! Mock data on dashboard pages is usually a literal list of objects whose
//! shape differs from page to page. `Record` lets those lists go through the
//! same filter and statistics code as the typed entities.

use crate::core::entity::Entity;
use crate::core::field::FieldValue;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record whose fields are the keys of a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create a record from a JSON object map
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Create a record from any JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(anyhow!("Expected a JSON object, got {}", other)),
        }
    }

    /// Parse a JSON array of objects into records
    pub fn list_from_json_str(json: &str) -> Result<Vec<Self>> {
        let records: Vec<Self> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Raw JSON value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Builder-style setter, mostly useful in tests and fixtures
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Entity for Record {
    fn resource_name() -> &'static str {
        "records"
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        self.0.get(field).map(FieldValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_fields() {
        let record = Record::default()
            .with("name", "Chat Bot")
            .with("status", "active")
            .with("success_rate", 92.5);

        assert_eq!(record.field_text("name"), "Chat Bot");
        assert_eq!(record.status(), "active");
        assert_eq!(record.field_number("success_rate"), Some(92.5));
        assert_eq!(record.field_value("missing"), None);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Record::from_value(json!({"a": 1})).is_ok());
        assert!(Record::from_value(json!([1, 2])).is_err());
        assert!(Record::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_list_from_json_str() {
        let records = Record::list_from_json_str(
            r#"[{"name": "Chat Bot", "tags": ["support", "chat"]}, {"name": null}]"#,
        )
        .expect("valid json");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field_text("tags"), "support chat");
        assert_eq!(records[1].field_text("name"), "");
    }

    #[test]
    fn test_list_from_json_str_rejects_scalars() {
        assert!(Record::list_from_json_str("[1, 2, 3]").is_err());
    }
}
