//! Entity trait defining the abstraction every listed record implements

use crate::core::field::FieldValue;
use std::borrow::Cow;

/// Base trait for all records displayed in a dashboard list.
///
/// An entity exposes its fields by name so that search, categorical
/// filtering and statistics can be written once for every record type.
/// Entities are never mutated by filtering: the view layer only reads them
/// and clones the ones that match.
///
/// Most entities are declared with [`impl_view_entity!`](crate::impl_view_entity),
/// which derives this trait from the struct fields.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The resource name used in logs and events (e.g., "employees")
    fn resource_name() -> &'static str;

    /// Fields searched by default when a page does not name its own
    fn searchable_fields() -> &'static [&'static str] {
        &[]
    }

    /// Get the value of a specific field by name
    ///
    /// Returns `None` for fields the entity does not have.
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    // === Utility Methods ===

    /// Text used for search and categorical comparison
    ///
    /// Missing and null fields are the empty string.
    fn field_text(&self, field: &str) -> Cow<'static, str> {
        match self.field_value(field) {
            Some(value) => Cow::Owned(value.render().into_owned()),
            None => Cow::Borrowed(""),
        }
    }

    /// Numeric value of a field, if it has one
    fn field_number(&self, field: &str) -> Option<f64> {
        self.field_value(field).and_then(|value| value.as_f64())
    }

    /// The entity status, or "" when it has none
    fn status(&self) -> Cow<'static, str> {
        self.field_text("status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct TestEntity {
        name: String,
        status: String,
        score: Option<f64>,
    }

    impl Entity for TestEntity {
        fn resource_name() -> &'static str {
            "test_entities"
        }

        fn searchable_fields() -> &'static [&'static str] {
            &["name"]
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "name" => Some(FieldValue::from(self.name.clone())),
                "status" => Some(FieldValue::from(self.status.clone())),
                "score" => Some(FieldValue::from(self.score)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_field_text_missing_is_empty() {
        let entity = TestEntity {
            name: "Chat Bot".into(),
            status: "active".into(),
            score: None,
        };

        assert_eq!(entity.field_text("name"), "Chat Bot");
        assert_eq!(entity.field_text("unknown"), "");
        assert_eq!(entity.field_text("score"), "");
        assert_eq!(entity.status(), "active");
    }

    #[test]
    fn test_field_number() {
        let entity = TestEntity {
            name: "Data Agent".into(),
            status: "busy".into(),
            score: Some(0.75),
        };

        assert_eq!(entity.field_number("score"), Some(0.75));
        assert_eq!(entity.field_number("name"), None);
        assert_eq!(entity.field_number("unknown"), None);
    }

    #[test]
    fn test_entity_metadata() {
        assert_eq!(TestEntity::resource_name(), "test_entities");
        assert_eq!(TestEntity::searchable_fields(), &["name"]);
    }
}
