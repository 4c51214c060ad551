//! Sorting and pagination of a filtered view

use crate::core::entity::Entity;
use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort field and direction
///
/// # Format
/// - `field:asc` or `field` (ascending)
/// - `field:desc` (descending)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// Parse a `field[:asc|:desc]` expression
    pub fn parse(expr: &str) -> Result<Self, ConfigError> {
        let (field, order) = match expr.split_once(':') {
            Some((field, "asc")) => (field, SortOrder::Asc),
            Some((field, "desc")) => (field, SortOrder::Desc),
            Some(_) => {
                return Err(ConfigError::InvalidSort {
                    expression: expr.to_string(),
                });
            }
            None => (expr, SortOrder::Asc),
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(ConfigError::InvalidSort {
                expression: expr.to_string(),
            });
        }

        Ok(Self {
            field: field.to_string(),
            order,
        })
    }

    /// Compare two entities on the sort field
    ///
    /// Numbers compare numerically, everything else by rendered text. An
    /// entity with a number sorts before one without.
    pub fn compare<T: Entity>(&self, a: &T, b: &T) -> Ordering {
        let ordering = match (a.field_number(&self.field), b.field_number(&self.field)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.field_text(&self.field).cmp(&b.field_text(&self.field)),
        };

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Sort a collection in place (stable)
    pub fn apply<T: Entity>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// A requested page of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// Page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, clamped to 1..=100
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, 100)
    }

    /// Slice a list according to this request
    pub fn slice<'a, T>(&self, items: &'a [T]) -> Paginated<'a, T> {
        let page = self.page();
        let limit = self.limit();
        let start = (page - 1).saturating_mul(limit).min(items.len());
        let end = start.saturating_add(limit).min(items.len());

        Paginated {
            data: &items[start..end],
            pagination: PaginationMeta::new(page, limit, items.len()),
        }
    }
}

/// One page of a list with its metadata
#[derive(Debug, Serialize)]
pub struct Paginated<'a, T> {
    pub data: &'a [T],
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit);
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
