// # Notify Sink Trait
//
// Defines the interface for consumers of door transition events.
//
// ## Implementations
//
// - Broadcast to live subscribers: `doorwatch_core::sink::BroadcastSink`
// - SMS dispatch to a recipient list: `doorwatch-sink-sms` crate
//
// ## Contract
//
// Sinks are isolated, single-shot consumers:
//
// - `deliver` is invoked once per detected transition, in detection order
// - A sink reads the event and acts; it never mutates shared monitor state
// - A sink reports its outcome instead of raising: the fan-out coordinator
//   aggregates outcomes for logging and never retries
// - Internal per-recipient I/O must be bounded (timeouts) so one delivery
//   cannot stall the poll loop indefinitely

use async_trait::async_trait;

use crate::state::TransitionEvent;

/// Result of one sink delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The event was handed to the transport (best effort for broadcast,
    /// at least one recipient for dispatch)
    Delivered,
    /// The sink chose not to act on this event (e.g. suppressed announcement)
    Skipped,
    /// The sink is unconfigured; a valid silent state, not an error
    Disabled,
    /// Every delivery attempt failed
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed(_))
    }
}

/// Trait for notification sink implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Deliver one transition event
    ///
    /// Must not panic and must not block beyond its own bounded I/O;
    /// failures are reported through the returned outcome.
    async fn deliver(&self, event: &TransitionEvent) -> DeliveryOutcome;

    /// Get the sink name (for logging/debugging)
    fn sink_name(&self) -> &'static str;
}
