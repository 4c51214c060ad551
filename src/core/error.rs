//! Typed error handling
//!
//! Nothing at this layer is fatal: a failed or timed-out load leaves the
//! page in its `Error` state with a message and a retry path.
//!
//! # Error Categories
//!
//! - [`ViewError`]: errors raised while driving a page through its lifecycle
//! - [`ConfigError`]: errors related to page configuration parsing and
//!   validation
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.load().await {
//!     Ok(state) => println!("page is {}", state),
//!     Err(e) if e.is_retryable() => show_retry(e.user_message()),
//!     Err(e) => show_error(e.user_message()),
//! }
//! ```

use serde::Serialize;
use std::time::Duration;

/// Errors raised while loading or driving a page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The data source rejected the fetch
    #[error("Failed to load {resource}: {message}")]
    Fetch { resource: String, message: String },

    /// The fetch did not resolve within the configured bound
    #[error("Loading {resource} timed out after {}ms", .after.as_millis())]
    Timeout { resource: String, after: Duration },

    /// No current user is available
    #[error("Authentication required")]
    Unauthenticated,

    /// The current user lacks the role the page requires
    #[error("Role '{role}' is required to view {resource}")]
    Forbidden { resource: String, role: String },

    /// The requested operation is not valid in the current state
    #[error("Cannot {operation} while {state}")]
    InvalidTransition { operation: String, state: String },

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ViewError::Fetch { .. } => "FETCH_FAILED",
            ViewError::Timeout { .. } => "LOAD_TIMEOUT",
            ViewError::Unauthenticated => "UNAUTHENTICATED",
            ViewError::Forbidden { .. } => "FORBIDDEN",
            ViewError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ViewError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the load can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ViewError::Fetch { .. } | ViewError::Timeout { .. } | ViewError::Internal(_)
        )
    }

    /// Message suitable for a toast or an error card
    pub fn user_message(&self) -> String {
        match self {
            ViewError::Fetch { resource, .. } => {
                format!("Could not load {}. Please try again.", resource)
            }
            ViewError::Timeout { resource, .. } => {
                format!("Loading {} is taking too long. Please try again.", resource)
            }
            ViewError::Unauthenticated => "Please sign in to continue.".to_string(),
            ViewError::Forbidden { resource, .. } => {
                format!("You do not have access to {}.", resource)
            }
            ViewError::InvalidTransition { .. } | ViewError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.user_message(),
            details: self.details(),
            retryable: self.is_retryable(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ViewError::Fetch { resource, message } => Some(serde_json::json!({
                "resource": resource,
                "cause": message,
            })),
            ViewError::Timeout { resource, after } => Some(serde_json::json!({
                "resource": resource,
                "timeout_ms": after.as_millis() as u64,
            })),
            ViewError::Forbidden { resource, role } => Some(serde_json::json!({
                "resource": resource,
                "role": role,
            })),
            _ => None,
        }
    }
}

/// Serializable error payload handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Whether a retry action should be offered
    pub retryable: bool,
}

/// Errors related to page configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid YAML or schema mismatch
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two stats on one page share a name
    #[error("Page '{page}' defines stat '{stat}' more than once")]
    DuplicateStat { page: String, stat: String },

    /// A stat uses a name the reducer reserves
    #[error("Page '{page}' cannot define a stat named '{stat}'")]
    ReservedStat { page: String, stat: String },

    /// Lookup of a page that is not configured
    #[error("Unknown page: {name}")]
    UnknownPage { name: String },

    /// A count stat without any value to count
    #[error("Count stat '{stat}' on page '{page}' needs `equals` or `one_of`")]
    EmptyCountStat { page: String, stat: String },

    /// Stat names cannot contain '.', which separates breakdown keys
    #[error("Page '{page}' has invalid stat name '{stat}': '.' is reserved for breakdowns")]
    InvalidStatName { page: String, stat: String },

    /// Sort expression is not `field[:asc|:desc]`
    #[error("Invalid sort expression '{expression}'")]
    InvalidSort { expression: String },
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO_ERROR",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
            ConfigError::DuplicateStat { .. } => "CONFIG_DUPLICATE_STAT",
            ConfigError::ReservedStat { .. } => "CONFIG_RESERVED_STAT",
            ConfigError::UnknownPage { .. } => "CONFIG_UNKNOWN_PAGE",
            ConfigError::EmptyCountStat { .. } => "CONFIG_EMPTY_COUNT_STAT",
            ConfigError::InvalidStatName { .. } => "CONFIG_INVALID_STAT_NAME",
            ConfigError::InvalidSort { .. } => "CONFIG_INVALID_SORT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = ViewError::Fetch {
            resource: "employees".into(),
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Failed to load employees: connection refused");
        assert_eq!(err.error_code(), "FETCH_FAILED");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_display() {
        let err = ViewError::Timeout {
            resource: "webhooks".into(),
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Loading webhooks timed out after 1500ms");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_forbidden_is_not_retryable() {
        let err = ViewError::Forbidden {
            resource: "security".into(),
            role: "admin".into(),
        };
        assert!(!err.is_retryable());
        assert!(!ViewError::Unauthenticated.is_retryable());
    }

    #[test]
    fn test_user_message_hides_cause() {
        let err = ViewError::Fetch {
            resource: "integrations".into(),
            message: "relation \"integrations\" does not exist".into(),
        };
        assert!(!err.user_message().contains("relation"));
    }

    #[test]
    fn test_to_response() {
        let err = ViewError::Fetch {
            resource: "jobs".into(),
            message: "boom".into(),
        };
        let response = err.to_response();
        assert_eq!(response.code, "FETCH_FAILED");
        assert!(response.retryable);

        let json = serde_json::to_value(&response).expect("serialize should succeed");
        assert_eq!(json["details"]["cause"], "boom");

        let plain = ViewError::Unauthenticated.to_response();
        let json = serde_json::to_value(&plain).expect("serialize should succeed");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_config_error_codes() {
        let err = ConfigError::UnknownPage { name: "x".into() };
        assert_eq!(err.error_code(), "CONFIG_UNKNOWN_PAGE");
        assert_eq!(err.to_string(), "Unknown page: x");
    }
}
