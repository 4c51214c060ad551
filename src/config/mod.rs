//! Configuration loading and management
//!
//! A dashboard is described in YAML: one entry per page with its searched
//! fields, filter selectors, stat cards and load settings.
//!
//! ```yaml
//! pages:
//!   - name: employees
//!     resource: ai_employees
//!     search_fields: [name, role, description]
//!     filters:
//!       - field: status
//!         options: [active, busy, offline]
//!     stats:
//!       - name: activeCount
//!         kind: count
//!         field: status
//!         equals: active
//!       - name: avgSuccessRate
//!         kind: average
//!         field: success_rate
//!     load_timeout_ms: 10000
//!     on_timeout: ready_empty
//! ```

use crate::core::auth::AuthPolicy;
use crate::core::entity::Entity;
use crate::core::error::ConfigError;
use crate::core::query::SortSpec;
use crate::core::stats::{StatPredicate, StatRule, StatsSpec, TOTAL};
use crate::core::view::{StatsScope, ViewSpec};
use crate::page::state::{LoadSettings, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// A categorical filter selector shown on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterFieldConfig {
    /// Entity field compared against the selection
    pub field: String,

    /// Label shown next to the selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Static options; empty means the options come from the source
    #[serde(default)]
    pub options: Vec<String>,
}

/// One stat card of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDefinition {
    /// Key of the stat in `DerivedStats`
    pub name: String,

    #[serde(flatten)]
    pub kind: StatKind,
}

/// How a configured stat is computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatKind {
    /// Count entities whose field equals one of the values
    Count {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equals: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        one_of: Vec<String>,
    },
    Sum {
        field: String,
    },
    Average {
        field: String,
    },
    Breakdown {
        field: String,
    },
}

impl StatKind {
    fn rule<T: Entity>(&self) -> StatRule<T> {
        match self {
            StatKind::Count { field, equals, one_of } => {
                let mut values = one_of.clone();
                if let Some(value) = equals {
                    values.insert(0, value.clone());
                }
                match values.as_slice() {
                    [single] => StatRule::Count(StatPredicate::field_equals(field.as_str(), single.as_str())),
                    _ => StatRule::Count(StatPredicate::FieldIn {
                        field: field.clone(),
                        values,
                    }),
                }
            }
            StatKind::Sum { field } => StatRule::Sum(field.clone()),
            StatKind::Average { field } => StatRule::Average(field.clone()),
            StatKind::Breakdown { field } => StatRule::Breakdown(field.clone()),
        }
    }
}

/// Configuration of one dashboard page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page name (e.g., "employees")
    pub name: String,

    /// Resource loaded by the page, used in logs, events and errors
    pub resource: String,

    /// Fields searched by the free-text term
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Categorical filter selectors
    #[serde(default)]
    pub filters: Vec<FilterFieldConfig>,

    /// Stat cards
    #[serde(default)]
    pub stats: Vec<StatDefinition>,

    /// Collection the stats are computed over
    #[serde(default)]
    pub stats_scope: StatsScope,

    /// Sort expression (`field[:asc|:desc]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Upper bound of a load in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_timeout_ms: Option<u64>,

    /// What a timed-out load turns into
    #[serde(default)]
    pub on_timeout: TimeoutPolicy,

    /// Role required to open the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<String>,
}

impl PageConfig {
    /// Check stat names, count values and the sort expression
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for stat in &self.stats {
            if stat.name == TOTAL {
                return Err(ConfigError::ReservedStat {
                    page: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
            if !seen.insert(stat.name.as_str()) {
                return Err(ConfigError::DuplicateStat {
                    page: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
            if stat.name.contains('.') {
                return Err(ConfigError::InvalidStatName {
                    page: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
            if matches!(&stat.kind, StatKind::Count { equals: None, one_of, .. } if one_of.is_empty()) {
                return Err(ConfigError::EmptyCountStat {
                    page: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
        }

        if let Some(sort) = &self.sort {
            SortSpec::parse(sort)?;
        }
        Ok(())
    }

    /// Build the view spec of this page for an entity type
    ///
    /// Without configured search fields, the entity's default searchable
    /// fields are used.
    pub fn view_spec<T: Entity>(&self) -> Result<ViewSpec<T>, ConfigError> {
        self.validate()?;

        let mut spec = if self.search_fields.is_empty() {
            ViewSpec::for_entity()
        } else {
            ViewSpec::new(self.search_fields.iter().cloned())
        };

        let stats = self
            .stats
            .iter()
            .fold(StatsSpec::new(), |spec, stat| spec.rule(stat.name.clone(), stat.kind.rule()));
        spec = spec.with_stats(stats).with_scope(self.stats_scope);

        if let Some(sort) = &self.sort {
            spec = spec.with_sort(SortSpec::parse(sort)?);
        }
        Ok(spec)
    }

    pub fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            timeout: self.load_timeout_ms.map(Duration::from_millis),
            on_timeout: self.on_timeout,
        }
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy::from_required_role(self.required_role.as_deref())
    }

    /// Names of the categorical filter fields
    pub fn filter_fields(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.field.as_str())
    }
}

/// Complete configuration of a dashboard
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Configured pages, in navigation order
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded dashboard config file");
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pages.iter().try_for_each(PageConfig::validate)
    }

    /// Find a page by name
    pub fn page(&self, name: &str) -> Result<&PageConfig, ConfigError> {
        self.pages
            .iter()
            .find(|page| page.name == name)
            .ok_or_else(|| ConfigError::UnknownPage {
                name: name.to_string(),
            })
    }

    /// Merge several configurations
    ///
    /// Pages keep first-seen order; a later page with the same name replaces
    /// the earlier definition.
    pub fn merge(configs: Vec<DashboardConfig>) -> Self {
        let mut pages: Vec<PageConfig> = Vec::new();
        for page in configs.into_iter().flat_map(|c| c.pages) {
            match pages.iter_mut().find(|existing| existing.name == page.name) {
                Some(existing) => *existing = page,
                None => pages.push(page),
            }
        }
        Self { pages }
    }

    /// The workforce console's pages
    pub fn default_config() -> Self {
        fn count(name: &str, field: &str, equals: &str) -> StatDefinition {
            StatDefinition {
                name: name.to_string(),
                kind: StatKind::Count {
                    field: field.to_string(),
                    equals: Some(equals.to_string()),
                    one_of: Vec::new(),
                },
            }
        }

        fn average(name: &str, field: &str) -> StatDefinition {
            StatDefinition {
                name: name.to_string(),
                kind: StatKind::Average {
                    field: field.to_string(),
                },
            }
        }

        fn filter(field: &str, options: &[&str]) -> FilterFieldConfig {
            FilterFieldConfig {
                field: field.to_string(),
                label: None,
                options: options.iter().map(|o| o.to_string()).collect(),
            }
        }

        fn page(name: &str, resource: &str, search_fields: &[&str]) -> PageConfig {
            PageConfig {
                name: name.to_string(),
                resource: resource.to_string(),
                search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
                filters: Vec::new(),
                stats: Vec::new(),
                stats_scope: StatsScope::Source,
                sort: None,
                load_timeout_ms: Some(10_000),
                on_timeout: TimeoutPolicy::ReadyEmpty,
                required_role: None,
            }
        }

        Self {
            pages: vec![
                PageConfig {
                    filters: vec![
                        filter("status", &["active", "busy", "offline"]),
                        filter("department", &[]),
                    ],
                    stats: vec![
                        count("activeCount", "status", "active"),
                        count("busyCount", "status", "busy"),
                        average("avgSuccessRate", "success_rate"),
                    ],
                    ..page("employees", "ai_employees", &["name", "role", "description"])
                },
                PageConfig {
                    filters: vec![
                        filter("severity", &["low", "medium", "high", "critical"]),
                        filter("status", &["open", "investigating", "resolved"]),
                    ],
                    stats: vec![
                        count("criticalCount", "severity", "critical"),
                        count("openCount", "status", "open"),
                    ],
                    sort: Some("occurred_at:desc".to_string()),
                    on_timeout: TimeoutPolicy::Error,
                    required_role: Some("admin".to_string()),
                    ..page("security", "security_events", &["name", "source", "description"])
                },
                PageConfig {
                    filters: vec![
                        filter("category", &[]),
                        filter("status", &["connected", "disconnected", "error"]),
                    ],
                    stats: vec![
                        count("connectedCount", "status", "connected"),
                        count("errorCount", "status", "error"),
                    ],
                    ..page("integrations", "integrations", &["name", "provider", "description"])
                },
                PageConfig {
                    filters: vec![filter("status", &["active", "inactive", "failing"])],
                    stats: vec![
                        count("activeCount", "status", "active"),
                        count("failingCount", "status", "failing"),
                        average("avgSuccessRate", "success_rate"),
                    ],
                    ..page("webhooks", "webhooks", &["name", "url", "events"])
                },
                PageConfig {
                    filters: vec![
                        filter("status", &["queued", "running", "completed", "failed"]),
                        filter("priority", &["low", "normal", "high"]),
                    ],
                    stats: vec![
                        count("runningCount", "status", "running"),
                        count("failedCount", "status", "failed"),
                        average("avgProgress", "progress"),
                    ],
                    sort: Some("created_at:desc".to_string()),
                    ..page("processing", "processing_jobs", &["name", "job_type"])
                },
            ],
        }
    }
}
