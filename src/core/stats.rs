//! Derived statistics reducer
//!
//! Reduces a collection into named numbers for the stat cards on top of a
//! dashboard page: `total`, counts of entities matching a predicate, sums,
//! averages and per-value breakdowns.
//!
//! The reducer is a pure function of its inputs. Whether the collection is
//! the unfiltered source or the filtered view is the caller's decision, see
//! [`StatsScope`](crate::core::view::StatsScope).

use crate::core::entity::Entity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name of the stat that always holds the collection length
pub const TOTAL: &str = "total";

/// Condition counted by a [`StatRule::Count`]
pub enum StatPredicate<T> {
    /// Rendered field value equals the given value (case-sensitive)
    FieldEquals { field: String, value: String },

    /// Rendered field value is one of the given values
    FieldIn { field: String, values: Vec<String> },

    /// Arbitrary predicate
    Custom(Arc<dyn Fn(&T) -> bool + Send + Sync>),
}

impl<T: Entity> StatPredicate<T> {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        StatPredicate::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn custom(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        StatPredicate::Custom(Arc::new(f))
    }

    /// Test an entity
    pub fn test(&self, entity: &T) -> bool {
        match self {
            StatPredicate::FieldEquals { field, value } => entity.field_text(field) == value.as_str(),
            StatPredicate::FieldIn { field, values } => {
                let text = entity.field_text(field);
                values.iter().any(|v| *v == text)
            }
            StatPredicate::Custom(f) => f(entity),
        }
    }
}

impl<T> Clone for StatPredicate<T> {
    fn clone(&self) -> Self {
        match self {
            StatPredicate::FieldEquals { field, value } => StatPredicate::FieldEquals {
                field: field.clone(),
                value: value.clone(),
            },
            StatPredicate::FieldIn { field, values } => StatPredicate::FieldIn {
                field: field.clone(),
                values: values.clone(),
            },
            StatPredicate::Custom(f) => StatPredicate::Custom(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for StatPredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatPredicate::FieldEquals { field, value } => {
                write!(f, "FieldEquals({} == {:?})", field, value)
            }
            StatPredicate::FieldIn { field, values } => {
                write!(f, "FieldIn({} in {:?})", field, values)
            }
            StatPredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// How a single named stat is reduced from the collection
pub enum StatRule<T> {
    /// Number of entities matching the predicate
    Count(StatPredicate<T>),

    /// Sum of the numeric values of a field (0 when none)
    Sum(String),

    /// Mean of the numeric values of a field over the entities that have one
    /// (0 when none)
    Average(String),

    /// One `"<name>.<value>"` count per distinct rendered value of a field
    Breakdown(String),
}

impl<T> Clone for StatRule<T> {
    fn clone(&self) -> Self {
        match self {
            StatRule::Count(p) => StatRule::Count(p.clone()),
            StatRule::Sum(f) => StatRule::Sum(f.clone()),
            StatRule::Average(f) => StatRule::Average(f.clone()),
            StatRule::Breakdown(f) => StatRule::Breakdown(f.clone()),
        }
    }
}

impl<T> fmt::Debug for StatRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatRule::Count(p) => write!(f, "Count({:?})", p),
            StatRule::Sum(field) => write!(f, "Sum({})", field),
            StatRule::Average(field) => write!(f, "Average({})", field),
            StatRule::Breakdown(field) => write!(f, "Breakdown({})", field),
        }
    }
}

/// Ordered set of named stat rules
pub struct StatsSpec<T> {
    rules: Vec<(String, StatRule<T>)>,
}

impl<T> fmt::Debug for StatsSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.rules.iter().map(|(name, rule)| (name, rule)))
            .finish()
    }
}

impl<T> Clone for StatsSpec<T> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<T> Default for StatsSpec<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: Entity> StatsSpec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. A later rule with the same name replaces the earlier one.
    pub fn rule(mut self, name: impl Into<String>, rule: StatRule<T>) -> Self {
        let name = name.into();
        self.rules.retain(|(existing, _)| *existing != name);
        self.rules.push((name, rule));
        self
    }

    /// Count entities whose field equals a value
    pub fn count_where(self, name: impl Into<String>, field: &str, value: &str) -> Self {
        self.rule(name, StatRule::Count(StatPredicate::field_equals(field, value)))
    }

    /// Count entities matching a closure
    pub fn count_if(
        self,
        name: impl Into<String>,
        f: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rule(name, StatRule::Count(StatPredicate::custom(f)))
    }

    pub fn sum(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.rule(name, StatRule::Sum(field.into()))
    }

    pub fn average(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.rule(name, StatRule::Average(field.into()))
    }

    pub fn breakdown(self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.rule(name, StatRule::Breakdown(field.into()))
    }

    /// Rule names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Named numbers derived from a collection
///
/// Always contains [`TOTAL`]. Values keep the order in which the rules were
/// declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedStats(IndexMap<String, f64>);

impl Default for DerivedStats {
    fn default() -> Self {
        let mut values = IndexMap::new();
        values.insert(TOTAL.to_string(), 0.0);
        Self(values)
    }
}

impl DerivedStats {
    /// Value of a stat, if it was computed
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Value of a stat as a count; 0 when absent
    pub fn count(&self, name: &str) -> usize {
        self.get(name).map_or(0, |v| v.max(0.0) as usize)
    }

    /// Collection length
    pub fn total(&self) -> usize {
        self.count(TOTAL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay stats computed elsewhere (e.g., fetched from the backend)
    ///
    /// Locally computed values win on conflicts so that `total` always
    /// reflects the collection actually held.
    pub fn merged_with(&self, remote: &DerivedStats) -> DerivedStats {
        let mut values = self.0.clone();
        for (name, value) in &remote.0 {
            values.entry(name.clone()).or_insert(*value);
        }
        DerivedStats(values)
    }
}

impl FromIterator<(String, f64)> for DerivedStats {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut stats = DerivedStats::default();
        stats.0.extend(iter);
        stats
    }
}

/// Reduce a collection into named stats
pub fn compute_stats<T: Entity>(collection: &[T], spec: &StatsSpec<T>) -> DerivedStats {
    let mut values: IndexMap<String, f64> = IndexMap::with_capacity(spec.rules.len() + 1);
    values.insert(TOTAL.to_string(), collection.len() as f64);

    for (name, rule) in &spec.rules {
        match rule {
            StatRule::Count(predicate) => {
                let count = collection.iter().filter(|e| predicate.test(e)).count();
                values.insert(name.clone(), count as f64);
            }
            StatRule::Sum(field) => {
                let sum = collection.iter().filter_map(|e| e.field_number(field)).sum();
                values.insert(name.clone(), sum);
            }
            StatRule::Average(field) => {
                values.insert(name.clone(), average(collection, field));
            }
            StatRule::Breakdown(field) => {
                let mut counts: IndexMap<String, f64> = IndexMap::new();
                for entity in collection {
                    *counts.entry(entity.field_text(field).into_owned()).or_insert(0.0) += 1.0;
                }
                for (value, count) in counts {
                    values.insert(format!("{}.{}", name, value), count);
                }
            }
        }
    }

    DerivedStats(values)
}

fn average<T: Entity>(collection: &[T], field: &str) -> f64 {
    let (sum, n) = collection
        .iter()
        .filter_map(|e| e.field_number(field))
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Record;

    fn agent(status: &str, success_rate: Option<f64>) -> Record {
        let record = Record::default().with("status", status);
        match success_rate {
            Some(rate) => record.with("success_rate", rate),
            None => record,
        }
    }

    fn spec() -> StatsSpec<Record> {
        StatsSpec::new()
            .count_where("busyCount", "status", "busy")
            .count_where("availableCount", "status", "available")
            .average("avgSuccessRate", "success_rate")
    }

    #[test]
    fn test_total_equals_length() {
        let collection = vec![agent("available", None), agent("busy", None), agent("busy", None)];
        let stats = compute_stats(&collection, &spec());

        assert_eq!(stats.total(), 3);
        assert_eq!(stats.count("busyCount"), 2);
        assert_eq!(stats.count("availableCount"), 1);
    }

    #[test]
    fn test_empty_collection_averages_to_zero() {
        let stats = compute_stats::<Record>(&[], &spec());

        assert_eq!(stats.total(), 0);
        assert_eq!(stats.get("avgSuccessRate"), Some(0.0));
        assert_eq!(stats.get("busyCount"), Some(0.0));
    }

    #[test]
    fn test_average_skips_entities_without_number() {
        let collection = vec![
            agent("busy", Some(90.0)),
            agent("busy", None),
            agent("available", Some(70.0)),
        ];
        let stats = compute_stats(&collection, &spec());
        assert_eq!(stats.get("avgSuccessRate"), Some(80.0));
    }

    #[test]
    fn test_sum_and_custom_count() {
        let collection = vec![agent("busy", Some(1.5)), agent("failed", Some(2.5)), agent("idle", None)];
        let spec = StatsSpec::new()
            .sum("rateSum", "success_rate")
            .count_if("notIdle", |r: &Record| r.status() != "idle");

        let stats = compute_stats(&collection, &spec);
        assert_eq!(stats.get("rateSum"), Some(4.0));
        assert_eq!(stats.count("notIdle"), 2);
    }

    #[test]
    fn test_field_in_predicate() {
        let collection = vec![agent("failed", None), agent("error", None), agent("ok", None)];
        let spec = StatsSpec::new().rule(
            "problems",
            StatRule::Count(StatPredicate::FieldIn {
                field: "status".into(),
                values: vec!["failed".into(), "error".into()],
            }),
        );

        assert_eq!(compute_stats(&collection, &spec).count("problems"), 2);
    }

    #[test]
    fn test_breakdown_in_first_seen_order() {
        let collection = vec![agent("busy", None), agent("available", None), agent("busy", None)];
        let spec = StatsSpec::new().breakdown("byStatus", "status");
        let stats = compute_stats(&collection, &spec);

        let names: Vec<_> = stats.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["total", "byStatus.busy", "byStatus.available"]);
        assert_eq!(stats.count("byStatus.busy"), 2);
    }

    #[test]
    fn test_deterministic() {
        let collection = vec![agent("busy", Some(10.0)), agent("available", Some(20.0))];
        let spec = spec();
        assert_eq!(compute_stats(&collection, &spec), compute_stats(&collection, &spec));
    }

    #[test]
    fn test_rule_with_same_name_replaces() {
        let spec: StatsSpec<Record> = StatsSpec::new()
            .count_where("x", "status", "busy")
            .average("x", "success_rate");
        assert_eq!(spec.names().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_merged_with_prefers_local() {
        let local: DerivedStats = vec![("busyCount".to_string(), 2.0)].into_iter().collect();
        let remote: DerivedStats = vec![
            ("total".to_string(), 99.0),
            ("monthlyCost".to_string(), 120.0),
        ]
        .into_iter()
        .collect();

        let merged = local.merged_with(&remote);
        assert_eq!(merged.total(), 0);
        assert_eq!(merged.get("monthlyCost"), Some(120.0));
        assert_eq!(merged.count("busyCount"), 2);
    }
}
