//! Core module containing the entity model, filtering and statistics

pub mod auth;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod predicate;
pub mod query;
pub mod record;
pub mod service;
pub mod stats;
pub mod view;

pub use auth::{AuthContext, AuthPolicy, AuthProvider, CurrentUser, NoAuthProvider, SessionAuthProvider};
pub use criteria::FilterCriteria;
pub use entity::Entity;
pub use error::{ConfigError, ErrorResponse, ViewError};
pub use events::{EventBus, EventEnvelope, PageEvent};
pub use field::FieldValue;
pub use predicate::{Predicate, filter_entities};
pub use query::{PageRequest, Paginated, PaginationMeta, SortOrder, SortSpec};
pub use record::Record;
pub use service::{EntitySource, FetchError, FetchResponse};
pub use stats::{DerivedStats, StatPredicate, StatRule, StatsSpec, TOTAL, compute_stats};
pub use view::{DerivedView, StatsScope, ViewSpec, derive_view};
