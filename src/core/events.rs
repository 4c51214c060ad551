//! Page lifecycle events
//!
//! The EventBus decouples page controllers from whoever renders them. It uses
//! `tokio::sync::broadcast`, so any number of presentation layers (a terminal
//! renderer, a websocket bridge, a test) can follow the same pages.
//!
//! ```text
//! PageController ──▶ EventBus::publish() ──▶ broadcast channel ──▶ subscribers
//! ```

use crate::page::state::PageStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something that happened to a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PageEvent {
    /// The page moved between lifecycle states
    StateChanged {
        resource: String,
        from: PageStatus,
        to: PageStatus,
    },
    /// The filtered view and stats were recomputed
    Recomputed {
        resource: String,
        filtered: usize,
        total: usize,
    },
    /// A load finished after a newer one started and was ignored
    StaleResponseDiscarded {
        resource: String,
        generation: u64,
        current: u64,
    },
}

impl PageEvent {
    /// Resource of the page this event belongs to
    pub fn resource(&self) -> &str {
        match self {
            PageEvent::StateChanged { resource, .. }
            | PageEvent::Recomputed { resource, .. }
            | PageEvent::StaleResponseDiscarded { resource, .. } => resource,
        }
    }

    /// Get the event name (state_changed, recomputed, ...)
    pub fn name(&self) -> &'static str {
        match self {
            PageEvent::StateChanged { .. } => "state_changed",
            PageEvent::Recomputed { .. } => "recomputed",
            PageEvent::StaleResponseDiscarded { .. } => "stale_response_discarded",
        }
    }
}

/// Envelope wrapping a page event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: PageEvent,
}

impl EventEnvelope {
    pub fn new(event: PageEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone and can be shared by every page of a dashboard.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before slow
    /// receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. With no subscribers the event is dropped.
    pub fn publish(&self, event: PageEvent) -> usize {
        self.sender.send(EventEnvelope::new(event)).unwrap_or(0)
    }

    /// Subscribe to all events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
