// # Broadcast Sink
//
// Publishes door transition events to every currently attached live
// subscriber and answers snapshot requests from late joiners.
//
// ## Purpose
//
// This is the in-process notification path: the socket transport layer
// subscribes, and each detected transition (including the first-reading
// announcement, since a connected subscriber explicitly wants current
// state) is pushed as a `StatusUpdate` payload.
//
// ## Delivery Semantics
//
// Best effort. The sink has no control over transport-layer delivery, so
// `deliver` always reports success. A subscriber that detaches mid-publish
// simply misses the update; a lagging subscriber drops the oldest updates
// (bounded channel). No subscriber ever observes a partially constructed
// event: payloads are built before the send.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::state::{DoorState, TransitionEvent};
use crate::traits::{DeliveryOutcome, NotifySink};

/// Default capacity of the subscriber channel
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Event payload pushed to live subscribers
///
/// Wire shape: `{"status": "open"|"closed", "oldStatus": "open"|"closed"|null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// The new door status
    pub status: DoorState,

    /// The status before the change; `null` for announcements and snapshots
    pub old_status: Option<DoorState>,
}

/// Broadcast notification sink
///
/// Wraps a [`tokio::sync::broadcast`] channel. Subscriber membership is
/// owned by the transport layer (it holds the receivers); the sink only
/// observes it and tolerates concurrent attach/detach during a publish.
#[derive(Debug)]
pub struct BroadcastSink {
    tx: broadcast::Sender<StatusUpdate>,

    // Last authoritative status, for snapshot() pulls from late joiners.
    last: Mutex<Option<DoorState>>,
}

impl BroadcastSink {
    /// Create a sink with the default subscriber channel capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a sink with an explicit subscriber channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            last: Mutex::new(None),
        }
    }

    /// Attach a new live subscriber
    ///
    /// The returned stream yields every update published after the call.
    /// A subscriber that wants the current state immediately should also
    /// call [`BroadcastSink::snapshot`].
    pub fn subscribe(&self) -> BroadcastStream<StatusUpdate> {
        BroadcastStream::new(self.tx.subscribe())
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Current state for a late-joining subscriber
    ///
    /// Returns the last authoritative status with `old_status: null`, or
    /// `None` if no authoritative reading has been observed yet.
    pub fn snapshot(&self) -> Option<StatusUpdate> {
        self.last.lock().unwrap().map(|status| StatusUpdate {
            status,
            old_status: None,
        })
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifySink for BroadcastSink {
    async fn deliver(&self, event: &TransitionEvent) -> DeliveryOutcome {
        *self.last.lock().unwrap() = Some(event.next);

        let update = StatusUpdate {
            status: event.next,
            old_status: event.previous,
        };

        // send() errors only when no receiver is attached; that is fine.
        match self.tx.send(update) {
            Ok(subscribers) => {
                debug!(subscribers, status = %event.next, "broadcast status update");
            }
            Err(_) => {
                debug!(status = %event.next, "no subscribers attached, update recorded");
            }
        }

        DeliveryOutcome::Delivered
    }

    fn sink_name(&self) -> &'static str {
        "broadcast"
    }
}
