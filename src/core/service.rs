//! Data source trait consumed by dashboard pages

use crate::core::auth::CurrentUser;
use crate::core::entity::Entity;
use crate::core::stats::DerivedStats;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Source of the collection shown on a page
///
/// Implementations wrap the backend client (or mock data). The page
/// controller calls each method at most once per load. The framework is
/// agnostic to where the data comes from.
#[async_trait]
pub trait EntitySource<T: Entity>: Send + Sync {
    /// Fetch the page's collection for the given user
    async fn fetch_entities(&self, user: &CurrentUser) -> Result<Vec<T>>;

    /// Fetch stats the backend computes itself (costs, quotas, ...)
    ///
    /// Default implementation has none.
    async fn fetch_stats(&self, _user: &CurrentUser) -> Result<Option<DerivedStats>> {
        Ok(None)
    }

    /// Fetch the options offered by the page's category selector
    ///
    /// Default implementation returns an empty list.
    async fn fetch_categories(&self, _user: &CurrentUser) -> Result<Vec<String>> {
        Ok(vec![])
    }
}

/// The `{ data, error }` envelope returned by hosted database clients
///
/// # Example
/// ```
/// use dashview::core::FetchResponse;
///
/// let response: FetchResponse<Vec<String>> =
///     serde_json::from_str(r#"{"data": null, "error": {"message": "JWT expired"}}"#).unwrap();
/// assert!(response.into_result().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse<D> {
    #[serde(default)]
    pub data: Option<D>,
    #[serde(default)]
    pub error: Option<FetchError>,
}

/// Error half of a [`FetchResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<D> FetchResponse<D> {
    pub fn ok(data: D) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(FetchError {
                message: message.into(),
                code: None,
            }),
        }
    }
}

impl<D: Default> FetchResponse<D> {
    /// Convert into a `Result`
    ///
    /// An error wins over data. Missing data without an error is treated as
    /// an empty result, not a failure.
    pub fn into_result(self) -> Result<D> {
        match (self.data, self.error) {
            (_, Some(error)) => match error.code {
                Some(code) => Err(anyhow!("{} ({})", error.message, code)),
                None => Err(anyhow!("{}", error.message)),
            },
            (Some(data), None) => Ok(data),
            (None, None) => Ok(D::default()),
        }
    }
}
