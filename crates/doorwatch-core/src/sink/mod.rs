//! In-process notification sinks
//!
//! External-transport sinks (SMS dispatch) live in their own crates; the
//! broadcast sink lives here because it is pure channel fan-out with no
//! outside dependencies.

pub mod broadcast;

pub use broadcast::{BroadcastSink, StatusUpdate};
