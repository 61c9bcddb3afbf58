//! Door state model and the debounced state tracker
//!
//! The tracker owns the single authoritative [`StateSnapshot`] for the
//! process and turns raw classified readings into [`TransitionEvent`]s:
//!
//! ```text
//! Uninitialized ──► Tracking(Closed) ◄──► Tracking(Open)
//! ```
//!
//! `Unknown` readings are a self-loop in every state: they never overwrite a
//! known value and never produce an event. The first authoritative reading
//! produces an announcement event (`previous == None`); after that, only
//! genuine value changes produce events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Tri-state door status
///
/// `Unknown` is non-authoritative: it represents a failed or absent sensor
/// reading and is never reported to sinks as a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Closed,
    Open,
    Unknown,
}

impl DoorState {
    /// Wire/message form of the state (`"closed"`, `"open"`, `"unknown"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Closed => "closed",
            DoorState::Open => "open",
            DoorState::Unknown => "unknown",
        }
    }

    /// Whether this is an authoritative (`Closed`/`Open`) reading
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, DoorState::Unknown)
    }
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw output of the door position switch
///
/// The switch is made (`Active`) when the door presses against it, i.e. the
/// door is closed. Probe failures are represented as `Err(Error)` by the
/// probe itself, not as a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawReading {
    /// Switch contact made (door closed)
    Active,
    /// Switch contact open (door open)
    Inactive,
}

/// Classify a probe read into a door status
///
/// Pure function: any probe failure maps to `Unknown`, never panics, never
/// propagates. Callers log the underlying error before classifying.
pub fn classify(reading: Result<RawReading, Error>) -> DoorState {
    match reading {
        Ok(RawReading::Active) => DoorState::Closed,
        Ok(RawReading::Inactive) => DoorState::Open,
        Err(_) => DoorState::Unknown,
    }
}

/// The last known-good door state and when it was observed
///
/// Exactly one authoritative snapshot exists per process, owned by the
/// [`StateTracker`]; everything handed out is a read-only copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Last authoritative status
    pub status: DoorState,

    /// When that status was most recently observed
    pub observed_at: DateTime<Utc>,
}

/// A detected door state transition
///
/// Immutable; created by the tracker exactly once per detected change.
/// `previous == None` marks the announcement: the first authoritative
/// reading of the process lifetime, which is not a physical transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    /// The status before the change; `None` for the announcement
    pub previous: Option<DoorState>,
    /// The new status (always authoritative)
    pub next: DoorState,
}

impl TransitionEvent {
    pub fn new(previous: Option<DoorState>, next: DoorState) -> Self {
        Self { previous, next }
    }

    /// Whether this is the one-time first-reading announcement
    pub fn is_announcement(&self) -> bool {
        self.previous.is_none()
    }
}

/// Debounced state tracker
///
/// Holds the last known-good state and decides, for each new classified
/// reading, whether a reportable transition occurred. Repeated identical
/// readings are compared by value and suppressed.
#[derive(Debug, Default)]
pub struct StateTracker {
    snapshot: Option<StateSnapshot>,
}

impl StateTracker {
    /// Create a tracker in the uninitialized sentinel state
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one classified reading into the tracker
    ///
    /// Returns an event when the reading is authoritative and differs from
    /// the stored state (or is the first authoritative reading), otherwise
    /// nothing. `Unknown` readings leave the stored snapshot untouched.
    pub fn observe(&mut self, reading: DoorState) -> Option<TransitionEvent> {
        if !reading.is_authoritative() {
            return None;
        }

        let previous = self.snapshot.as_ref().map(|s| s.status);

        // Refresh the observation time even when the value is unchanged
        self.snapshot = Some(StateSnapshot {
            status: reading,
            observed_at: Utc::now(),
        });

        if previous == Some(reading) {
            return None;
        }

        Some(TransitionEvent::new(previous, reading))
    }

    /// Read-only copy of the current snapshot
    ///
    /// `None` until the first authoritative reading has been observed.
    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe_sequence(readings: &[DoorState]) -> (StateTracker, Vec<TransitionEvent>) {
        let mut tracker = StateTracker::new();
        let events = readings
            .iter()
            .filter_map(|&r| tracker.observe(r))
            .collect();
        (tracker, events)
    }

    #[test]
    fn unknown_only_sequences_emit_nothing() {
        let (tracker, events) =
            observe_sequence(&[DoorState::Unknown, DoorState::Unknown, DoorState::Unknown]);

        assert!(events.is_empty());
        assert!(tracker.snapshot().is_none(), "sentinel must be preserved");
    }

    #[test]
    fn repeated_identical_readings_emit_one_announcement() {
        let (tracker, events) =
            observe_sequence(&[DoorState::Closed, DoorState::Closed, DoorState::Closed]);

        assert_eq!(
            events,
            vec![TransitionEvent::new(None, DoorState::Closed)],
            "exactly one announcement expected"
        );
        assert!(events[0].is_announcement());
        assert_eq!(tracker.snapshot().unwrap().status, DoorState::Closed);
    }

    #[test]
    fn transitions_are_emitted_in_order_with_debounce() {
        let (_, events) = observe_sequence(&[
            DoorState::Closed,
            DoorState::Open,
            DoorState::Open,
            DoorState::Closed,
        ]);

        assert_eq!(
            events,
            vec![
                TransitionEvent::new(None, DoorState::Closed),
                TransitionEvent::new(Some(DoorState::Closed), DoorState::Open),
                TransitionEvent::new(Some(DoorState::Open), DoorState::Closed),
            ]
        );
    }

    #[test]
    fn unknown_between_identical_readings_does_not_retrigger() {
        let (tracker, events) =
            observe_sequence(&[DoorState::Closed, DoorState::Unknown, DoorState::Closed]);

        assert_eq!(events, vec![TransitionEvent::new(None, DoorState::Closed)]);
        assert_eq!(tracker.snapshot().unwrap().status, DoorState::Closed);
    }

    #[test]
    fn unknown_never_overwrites_known_state() {
        let mut tracker = StateTracker::new();
        tracker.observe(DoorState::Open);
        tracker.observe(DoorState::Unknown);

        assert_eq!(tracker.snapshot().unwrap().status, DoorState::Open);
    }

    #[test]
    fn classify_maps_probe_failures_to_unknown() {
        assert_eq!(classify(Ok(RawReading::Active)), DoorState::Closed);
        assert_eq!(classify(Ok(RawReading::Inactive)), DoorState::Open);
        assert_eq!(
            classify(Err(Error::probe("hardware not found"))),
            DoorState::Unknown
        );
    }

    #[test]
    fn door_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DoorState::Open).unwrap(),
            "\"open\""
        );
        assert_eq!(
            serde_json::to_string(&DoorState::Closed).unwrap(),
            "\"closed\""
        );
    }
}
