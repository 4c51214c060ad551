//! Filter criteria: the combined search and categorical filter input

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The user's current filter input for one page.
///
/// Created empty when the page starts, mutated only by user input, never
/// persisted. An empty or whitespace-only `search_term` and an empty
/// categorical value both mean "no constraint".
///
/// # Example
/// ```
/// use dashview::core::FilterCriteria;
///
/// let criteria = FilterCriteria::default()
///     .with_search("bot")
///     .with_filter("status", "active");
///
/// assert_eq!(criteria.active_filters().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Free-text search term
    pub search_term: String,

    /// Selected value per categorical field (field name -> value)
    #[serde(rename = "filters")]
    pub categorical: IndexMap<String, String>,
}

impl FilterCriteria {
    /// Create empty criteria
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the search term
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Builder: set a categorical filter
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.categorical.insert(field.into(), value.into());
        self
    }

    /// Parse criteria from a JSON object string
    ///
    /// Format: `{"search_term": "bot", "filters": {"status": "active"}}`.
    /// Both keys are optional.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the search term. Returns whether the criteria changed.
    pub fn set_search_term(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if self.search_term == term {
            return false;
        }
        self.search_term = term;
        true
    }

    /// Set the selected value of a categorical field. Returns whether the
    /// criteria changed.
    ///
    /// Selecting "" for a field that was never set is not a change: both
    /// mean "no constraint".
    pub fn set_filter(&mut self, field: impl Into<String>, value: impl Into<String>) -> bool {
        let field = field.into();
        let value = value.into();

        match self.categorical.get(&field) {
            Some(current) if *current == value => false,
            None if value.is_empty() => false,
            _ => {
                self.categorical.insert(field, value);
                true
            }
        }
    }

    /// Reset every field to "no constraint". Returns whether anything changed.
    pub fn clear(&mut self) -> bool {
        if self.categorical.is_empty() && self.search_term.is_empty() {
            return false;
        }
        self.search_term.clear();
        self.categorical.clear();
        true
    }

    /// The search term without surrounding whitespace, if it constrains anything
    pub fn effective_search(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Categorical filters that constrain anything (non-empty value)
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categorical
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    /// Whether these criteria match every entity
    pub fn is_empty(&self) -> bool {
        self.effective_search().is_none() && self.active_filters().next().is_none()
    }
}
