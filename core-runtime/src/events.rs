//! # Event Bus System
//!
//! Broadcasts typed lifecycle events using `tokio::sync::broadcast` so that
//! observers (a status endpoint, a notifier, tests) can follow sync passes
//! without coupling to the pipeline.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::Started {
//!         job_id: "job-1".to_string(),
//!         album_url: "https://photos.app.goo.gl/abc".to_string(),
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Sync started");
//! # }
//! ```
//!
//! Emitting with no subscribers returns an error; publishers ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Service lifecycle events
    Service(ServiceEvent),
    /// Album sync events
    Sync(SyncEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Service(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
        }
    }
}

/// Service lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ServiceEvent {
    /// Destination reachable and credentials accepted.
    Connected {
        user_id: String,
        user_name: String,
    },
    /// Scheduler stopped after a shutdown request.
    Stopped,
}

impl ServiceEvent {
    fn description(&self) -> &str {
        match self {
            ServiceEvent::Connected { .. } => "Connected to destination",
            ServiceEvent::Stopped => "Service stopped",
        }
    }
}

/// Events for one album pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Pass initiated.
    Started {
        /// Unique identifier for this pass.
        job_id: String,
        album_url: String,
    },
    /// Phase change during a pass.
    Progress {
        job_id: String,
        /// Items handled so far.
        items_processed: u64,
        /// Items in the album, once known.
        total_items: Option<u64>,
        /// Current phase (e.g., "Resolving album", "Transferring").
        phase: String,
    },
    /// Pass finished; individual items may still have failed.
    Completed {
        job_id: String,
        album_url: String,
        title: String,
        added: u64,
        skipped: u64,
        failed: u64,
        deduplicated: u64,
        total: u64,
        duration_secs: u64,
    },
    /// Pass aborted before any item was handled.
    Failed {
        job_id: String,
        album_url: String,
        /// Human-readable error message.
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Sync started",
            SyncEvent::Progress { .. } => "Sync in progress",
            SyncEvent::Completed { .. } => "Sync completed",
            SyncEvent::Failed { .. } => "Sync failed",
        }
    }
}

/// Central broadcast channel for [`CoreEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> CoreEvent {
        CoreEvent::Sync(SyncEvent::Started {
            job_id: "job-1".to_string(),
            album_url: "https://photos.app.goo.gl/abc".to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(started()).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(started()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), started());
        assert_eq!(sub2.recv().await.unwrap(), started());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for _ in 0..5 {
            bus.emit(started()).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(started()).unwrap();
        assert_eq!(json["type"], "Sync");
        assert_eq!(json["payload"]["event"], "Started");
        assert_eq!(json["payload"]["job_id"], "job-1");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, started());
    }
}
