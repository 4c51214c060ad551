//! Derived view: the filtered collection plus its statistics
//!
//! [`derive_view`] is a pure function of `(source, criteria, spec)`. The page
//! controller decides *when* to call it; this module only decides *what* it
//! returns.

use crate::core::criteria::FilterCriteria;
use crate::core::entity::Entity;
use crate::core::predicate::Predicate;
use crate::core::query::{PageRequest, Paginated, SortSpec};
use crate::core::stats::{DerivedStats, StatsSpec, compute_stats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection the stats are reduced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsScope {
    /// The whole source collection, independent of the filters
    #[default]
    Source,
    /// Only the entities that pass the filters
    Filtered,
}

/// Everything a page needs to turn a source collection into a view
pub struct ViewSpec<T> {
    /// Fields searched by the free-text term
    pub search_fields: Vec<String>,
    /// Named stats shown on the page
    pub stats: StatsSpec<T>,
    /// Collection the stats are computed over
    pub stats_scope: StatsScope,
    /// Order of the filtered rows; `None` keeps source order
    pub sort: Option<SortSpec>,
}

impl<T: Entity> ViewSpec<T> {
    /// Spec searching the entity type's default fields, with no stats
    pub fn for_entity() -> Self {
        Self::new(T::searchable_fields().iter().copied())
    }

    pub fn new<I, S>(search_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            search_fields: search_fields.into_iter().map(Into::into).collect(),
            stats: StatsSpec::new(),
            stats_scope: StatsScope::Source,
            sort: None,
        }
    }

    pub fn with_stats(mut self, stats: StatsSpec<T>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_scope(mut self, scope: StatsScope) -> Self {
        self.stats_scope = scope;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Compile criteria for this spec's searched fields
    pub fn predicate(&self, criteria: &FilterCriteria) -> Predicate {
        Predicate::build(criteria, &self.search_fields)
    }
}

impl<T> Clone for ViewSpec<T> {
    fn clone(&self) -> Self {
        Self {
            search_fields: self.search_fields.clone(),
            stats: self.stats.clone(),
            stats_scope: self.stats_scope,
            sort: self.sort.clone(),
        }
    }
}

impl<T> fmt::Debug for ViewSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSpec")
            .field("search_fields", &self.search_fields)
            .field("stats", &self.stats)
            .field("stats_scope", &self.stats_scope)
            .field("sort", &self.sort)
            .finish()
    }
}

/// The filtered rows and the stats shown above them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView<T> {
    /// Entities passing the filters, in display order
    pub filtered: Vec<T>,
    /// Stats reduced over the configured scope
    pub stats: DerivedStats,
    /// Length of the unfiltered source
    pub source_len: usize,
}

impl<T> DerivedView<T> {
    /// An empty view, as shown before data arrives
    pub fn empty() -> Self {
        Self {
            filtered: Vec::new(),
            stats: DerivedStats::default(),
            source_len: 0,
        }
    }

    /// Number of rows passing the filters
    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Whether the filters hide some of the source rows
    pub fn is_narrowed(&self) -> bool {
        self.filtered.len() < self.source_len
    }

    /// One page of the filtered rows
    pub fn page(&self, request: PageRequest) -> Paginated<'_, T> {
        request.slice(&self.filtered)
    }
}

/// Filter, sort and reduce a source collection
pub fn derive_view<T: Entity>(
    source: &[T],
    criteria: &FilterCriteria,
    spec: &ViewSpec<T>,
) -> DerivedView<T> {
    let mut filtered = spec.predicate(criteria).apply(source);
    if let Some(sort) = &spec.sort {
        sort.apply(&mut filtered);
    }

    let stats = match spec.stats_scope {
        StatsScope::Source => compute_stats(source, &spec.stats),
        StatsScope::Filtered => compute_stats(&filtered, &spec.stats),
    };

    DerivedView {
        filtered,
        stats,
        source_len: source.len(),
    }
}
