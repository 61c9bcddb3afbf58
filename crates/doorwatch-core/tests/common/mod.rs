//! Test doubles and common utilities for monitor contract tests
//!
//! These doubles verify the poll loop's architectural guarantees (single
//! timer, sink isolation, ordering, deterministic shutdown) without any real
//! hardware or transport.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use doorwatch_core::config::MonitorConfig;
use doorwatch_core::error::Result;
use doorwatch_core::state::{RawReading, TransitionEvent};
use doorwatch_core::traits::{DeliveryOutcome, DoorProbe, NotifySink};

/// One scripted probe reading
#[derive(Debug, Clone, Copy)]
pub enum ProbeStep {
    /// Switch made: classifies to `Closed`
    Closed,
    /// Switch open: classifies to `Open`
    Open,
    /// Read failure: classifies to `Unknown`
    Fail,
}

/// A probe that replays a fixed script, repeating the final step forever
pub struct ScriptedProbe {
    steps: Vec<ProbeStep>,
    read_count: Arc<AtomicUsize>,
}

impl ScriptedProbe {
    /// Create a scripted probe; `steps` must be non-empty
    pub fn new(steps: Vec<ProbeStep>) -> Self {
        assert!(!steps.is_empty(), "scripted probe needs at least one step");
        Self {
            steps,
            read_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of read() invocations, usable after the probe is
    /// boxed into the monitor
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.read_count)
    }
}

#[async_trait::async_trait]
impl DoorProbe for ScriptedProbe {
    async fn read(&self) -> Result<RawReading> {
        let index = self.read_count.fetch_add(1, Ordering::SeqCst);
        let step = self.steps[index.min(self.steps.len() - 1)];

        match step {
            ProbeStep::Closed => Ok(RawReading::Active),
            ProbeStep::Open => Ok(RawReading::Inactive),
            ProbeStep::Fail => Err(doorwatch_core::Error::probe("scripted read failure")),
        }
    }

    fn probe_name(&self) -> &'static str {
        "scripted"
    }
}

/// A sink that records every event it is handed
pub struct CountingSink {
    name: &'static str,
    delivered: Mutex<Vec<TransitionEvent>>,
}

impl CountingSink {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            delivered: Mutex::new(Vec::new()),
        })
    }

    /// Events delivered so far, in order
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl NotifySink for CountingSink {
    async fn deliver(&self, event: &TransitionEvent) -> DeliveryOutcome {
        self.delivered.lock().unwrap().push(event.clone());
        DeliveryOutcome::Delivered
    }

    fn sink_name(&self) -> &'static str {
        self.name
    }
}

/// A sink whose every delivery attempt fails
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NotifySink for FailingSink {
    async fn deliver(&self, _event: &TransitionEvent) -> DeliveryOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        DeliveryOutcome::Failed("simulated delivery failure".to_string())
    }

    fn sink_name(&self) -> &'static str {
        "failing"
    }
}

/// Monitor config with the shortest valid interval, for fast tests
pub fn fast_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval_secs: 1,
        probe_timeout_secs: 1,
        event_channel_capacity: 100,
    }
}
