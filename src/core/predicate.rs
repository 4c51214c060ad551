//! Filter predicate builder
//!
//! Compiles [`FilterCriteria`] into a [`Predicate`] that tests entities:
//!
//! - search: case-insensitive substring over the searched fields (OR across
//!   fields)
//! - categorical: exact, case-sensitive equality per active filter
//! - everything is combined with AND
//!
//! Compiling once per criteria change keeps the lower-cased needle and the
//! active constraints out of the per-entity loop.

use crate::core::criteria::FilterCriteria;
use crate::core::entity::Entity;

/// A compiled filter over entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    needle: Option<String>,
    search_fields: Vec<String>,
    constraints: Vec<(String, String)>,
}

impl Predicate {
    /// Compile criteria against an explicit list of searched fields
    pub fn build<S: AsRef<str>>(criteria: &FilterCriteria, search_fields: &[S]) -> Self {
        Self {
            needle: criteria.effective_search().map(str::to_lowercase),
            search_fields: search_fields.iter().map(|f| f.as_ref().to_string()).collect(),
            constraints: criteria
                .active_filters()
                .map(|(field, value)| (field.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// Compile criteria against the entity type's default searchable fields
    pub fn for_entity<T: Entity>(criteria: &FilterCriteria) -> Self {
        Self::build(criteria, T::searchable_fields())
    }

    /// Whether this predicate lets every entity through
    pub fn is_noop(&self) -> bool {
        self.needle.is_none() && self.constraints.is_empty()
    }

    /// Test an entity against every active constraint
    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        self.matches_search(entity) && self.matches_categorical(entity)
    }

    fn matches_search<T: Entity>(&self, entity: &T) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };

        self.search_fields
            .iter()
            .any(|field| entity.field_text(field).to_lowercase().contains(needle.as_str()))
    }

    fn matches_categorical<T: Entity>(&self, entity: &T) -> bool {
        self.constraints
            .iter()
            .all(|(field, value)| entity.field_text(field) == value.as_str())
    }

    /// Filter a collection, cloning the matching entities in source order
    pub fn apply<T: Entity>(&self, source: &[T]) -> Vec<T> {
        if self.is_noop() {
            return source.to_vec();
        }
        source.iter().filter(|e| self.matches(*e)).cloned().collect()
    }
}

/// Test a single entity against criteria
///
/// Convenience for one-off checks; use [`Predicate::build`] when filtering
/// a collection.
pub fn matches<T: Entity, S: AsRef<str>>(
    criteria: &FilterCriteria,
    search_fields: &[S],
    entity: &T,
) -> bool {
    Predicate::build(criteria, search_fields).matches(entity)
}

/// Filter a collection with criteria
pub fn filter_entities<T: Entity, S: AsRef<str>>(
    source: &[T],
    criteria: &FilterCriteria,
    search_fields: &[S],
) -> Vec<T> {
    Predicate::build(criteria, search_fields).apply(source)
}
