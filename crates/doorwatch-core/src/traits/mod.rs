//! Core traits for the door monitor
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DoorProbe`]: Read the door position switch
//! - [`NotifySink`]: Deliver transition events to an external consumer

pub mod door_probe;
pub mod notify_sink;

pub use door_probe::DoorProbe;
pub use notify_sink::{DeliveryOutcome, NotifySink};
