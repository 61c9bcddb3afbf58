// # doorwatch-core
//
// Core library for the door state monitor and notification fan-out.
//
// ## Architecture Overview
//
// This library provides the core functionality for door monitoring:
// - **DoorProbe**: Trait for reading the door position switch
// - **NotifySink**: Trait for delivering transition events to consumers
// - **StateTracker**: Debounced last-known-good state with transition detection
// - **DoorMonitor**: Poll loop that drives probe → classify → track → fan-out
// - **BroadcastSink**: In-process sink publishing to live subscribers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single Poll Loop**: One timer per process drives all detection
// 3. **Sink Isolation**: A failing sink never affects sibling sinks
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Fault Tolerance**: No probe or sink failure is fatal to the loop

pub mod config;
pub mod error;
pub mod monitor;
pub mod sink;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{DoorwatchConfig, MonitorConfig, ProbeConfig, SmsConfig};
pub use error::{Error, Result};
pub use monitor::{DoorMonitor, MonitorEvent, MonitorHandle};
pub use sink::{BroadcastSink, StatusUpdate};
pub use state::{DoorState, RawReading, StateSnapshot, StateTracker, TransitionEvent, classify};
pub use traits::{DeliveryOutcome, DoorProbe, NotifySink};
