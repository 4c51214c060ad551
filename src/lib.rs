//! # Dashview
//!
//! Filtered entity lists with derived statistics for dashboard pages.
//!
//! ## Features
//!
//! - **Filter Predicates**: Free-text search plus categorical equality filters, compiled once per criteria change
//! - **Derived Statistics**: Named counts, sums, averages and breakdowns, always including `total`
//! - **Reactive Recompute**: The view is rebuilt on every data or criteria change, and only then
//! - **Stale-Response Guard**: Responses of superseded loads never overwrite newer data
//! - **Configurable Timeouts**: A hung load resolves to an empty page or a retryable error
//! - **Configuration-Based**: Describe pages, filters and stat cards in YAML
//!
//! ## Quick Start
//!
//! ```rust
//! use dashview::prelude::*;
//!
//! let source = vec![
//!     Record::default().with("name", "Chat Bot").with("status", "active"),
//!     Record::default().with("name", "Scheduler").with("status", "busy"),
//! ];
//!
//! let spec = ViewSpec::new(["name"]).with_stats(StatsSpec::new().count_where("activeCount", "status", "active"));
//! let criteria = FilterCriteria::new().with_search("chat");
//!
//! let view = derive_view(&source, &criteria, &spec);
//! assert_eq!(view.len(), 1);
//! assert_eq!(view.stats.total(), 2);
//! assert_eq!(view.stats.count("activeCount"), 1);
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod page;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy, AuthProvider, CurrentUser, NoAuthProvider, SessionAuthProvider},
        criteria::FilterCriteria,
        entity::Entity,
        error::{ConfigError, ErrorResponse, ViewError},
        events::{EventBus, EventEnvelope, PageEvent},
        field::FieldValue,
        predicate::Predicate,
        query::{PageRequest, SortOrder, SortSpec},
        record::Record,
        service::{EntitySource, FetchResponse},
        stats::{DerivedStats, StatPredicate, StatRule, StatsSpec, compute_stats},
        view::{DerivedView, StatsScope, ViewSpec, derive_view},
    };

    // === Macros ===
    pub use crate::impl_view_entity;

    // === Pages ===
    pub use crate::page::{LoadSettings, PageController, PageState, PageStatus, TimeoutPolicy};

    // === Storage ===
    pub use crate::storage::InMemorySource;

    // === Config ===
    pub use crate::config::{DashboardConfig, PageConfig, StatDefinition, StatKind};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
