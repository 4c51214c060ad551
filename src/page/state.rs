//! Page lifecycle states
//!
//! ```text
//!            user available            fetch resolved
//!   Idle ───────────────────▶ Loading ───────────────▶ Ready
//!    ▲                        │  ▲  ▲                    │
//!    │                 fetch  │  │  └────── refresh ─────┘
//!    │               rejected ▼  │ retry
//!    │                       Error
//!    └──────────── deactivate (from any state)
//! ```

use crate::core::error::ViewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// State without payload, used in events and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl PageStatus {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(self, next: PageStatus) -> bool {
        use PageStatus::*;

        matches!(
            (self, next),
            (Idle, Loading)
                | (Loading, Ready)
                | (Loading, Error)
                // a newer load supersedes the one in flight
                | (Loading, Loading)
                | (Error, Loading)
                | (Ready, Loading)
                // access denied before any fetch
                | (Idle, Error)
                | (Ready, Error)
                | (Error, Error)
                | (_, Idle)
        )
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageStatus::Idle => "idle",
            PageStatus::Loading => "loading",
            PageStatus::Ready => "ready",
            PageStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Current state of a page, with its payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageState {
    /// Waiting for an authenticated user
    #[default]
    Idle,

    /// A load is in flight
    Loading { generation: u64 },

    /// Data is available and the view is computed
    Ready,

    /// The last load failed; terminal until retried
    Error(ViewError),
}

impl PageState {
    pub fn status(&self) -> PageStatus {
        match self {
            PageState::Idle => PageStatus::Idle,
            PageState::Loading { .. } => PageStatus::Loading,
            PageState::Ready => PageStatus::Ready,
            PageState::Error(_) => PageStatus::Error,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PageState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PageState::Loading { .. })
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            PageState::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// What to do when a load exceeds its timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Show the page with an empty collection
    ReadyEmpty,
    /// Show the error card with a retry action
    #[default]
    Error,
}

/// Liveness bound applied to each load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSettings {
    /// Upper bound of a load; `None` waits forever
    pub timeout: Option<Duration>,
    pub on_timeout: TimeoutPolicy,
}

impl LoadSettings {
    pub fn with_timeout(timeout: Duration, on_timeout: TimeoutPolicy) -> Self {
        Self {
            timeout: Some(timeout),
            on_timeout,
        }
    }
}
