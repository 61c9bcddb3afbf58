//! Core door monitor engine
//!
//! The DoorMonitor is responsible for:
//! - Polling the door probe on a fixed interval
//! - Classifying raw reads into door states
//! - Feeding readings through the debounced StateTracker
//! - Fanning detected transitions out to every registered NotifySink
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   tick    ┌──────────────┐
//! │ DoorProbe │──────────►│ DoorMonitor  │
//! └───────────┘  classify └──────────────┘
//!                                │ observe
//!                        ┌───────┴────────┐
//!                        │  StateTracker  │
//!                        └───────┬────────┘
//!                                │ TransitionEvent
//!                 ┌──────────────┼──────────────┐
//!                 ▼              ▼              ▼
//!          ┌────────────┐ ┌────────────┐ ┌────────────┐
//!          │ NotifySink │ │ NotifySink │ │  Events    │
//!          │ (broadcast)│ │ (dispatch) │ │ (observe)  │
//!          └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## Poll Flow
//!
//! 1. Tick fires (sequential; a slow poll delays the next tick, never overlaps)
//! 2. Probe read, bounded by the configured timeout
//! 3. Classify: any failure becomes `Unknown` for this iteration
//! 4. Tracker decides whether a reportable transition occurred
//! 5. On a transition, every sink's `deliver` is invoked independently
//! 6. Per-sink outcomes are logged; nothing here is fatal to the loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::state::{StateSnapshot, StateTracker, TransitionEvent, classify};
use crate::traits::{DeliveryOutcome, DoorProbe, NotifySink};

/// Events emitted by the DoorMonitor for external observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Poll loop started
    Started {
        sink_count: usize,
    },

    /// A probe read failed or timed out (this iteration observed `Unknown`)
    ProbeFailed {
        error: String,
    },

    /// A reportable transition was detected
    TransitionDetected {
        event: TransitionEvent,
    },

    /// One sink finished a delivery attempt
    SinkDelivered {
        sink: &'static str,
        outcome: DeliveryOutcome,
    },

    /// Poll loop stopped
    Stopped {
        reason: String,
    },
}

/// Owned handle to a running poll loop
///
/// Returned by [`DoorMonitor::start`]. Dropping the handle does NOT stop the
/// loop; call [`MonitorHandle::shutdown`] for a deterministic stop: the loop
/// exits before its next scheduled tick, in-flight sink deliveries for the
/// current tick complete, and the poll task is joined.
pub struct MonitorHandle {
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl MonitorHandle {
    /// Whether the loop has been shut down through this handle
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop the poll loop and wait for the poll task to exit
    ///
    /// Idempotent: repeated calls are no-ops.
    pub async fn shutdown(&self) {
        let tx = { self.shutdown_tx.lock().unwrap().take() };
        if let Some(tx) = tx {
            // The task may already have exited; a send failure is fine.
            let _ = tx.send(());
        }

        let task = { self.task.lock().await.take() };
        if let Some(task) = task
            && let Err(e) = task.await
        {
            error!("poll task join failed: {}", e);
        }

        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Core door monitor
///
/// Owns the probe, the debounced state tracker, and the registered sinks,
/// and drives them from a single background poll task.
///
/// ## Lifecycle
///
/// 1. Create with [`DoorMonitor::new`]
/// 2. Start with [`DoorMonitor::start`] (idempotent; exactly one active
///    poll task per monitor)
/// 3. Stop with [`MonitorHandle::shutdown`]
///
/// ## Threading
///
/// The monitor is cheaply cloneable and thread-safe. The tracker has a
/// single writer (the poll task); [`DoorMonitor::snapshot`] readers only
/// take brief read copies.
#[derive(Clone)]
pub struct DoorMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    /// Door probe to poll
    probe: Box<dyn DoorProbe>,

    /// Registered notification sinks, invoked independently per transition
    sinks: Vec<Arc<dyn NotifySink>>,

    /// Poll loop settings
    config: MonitorConfig,

    /// Debounced last-known-good state (single writer: the poll task)
    tracker: Mutex<StateTracker>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<MonitorEvent>,

    /// Handle of the currently running poll task, if any
    handle: Mutex<Option<Arc<MonitorHandle>>>,
}

impl DoorMonitor {
    /// Create a new door monitor
    ///
    /// # Parameters
    ///
    /// - `probe`: Door probe implementation
    /// - `sinks`: Notification sinks, invoked in registration order
    /// - `config`: Poll loop configuration
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields
    /// monitor events.
    pub fn new(
        probe: Box<dyn DoorProbe>,
        sinks: Vec<Arc<dyn NotifySink>>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let monitor = Self {
            inner: Arc::new(MonitorInner {
                probe,
                sinks,
                config,
                tracker: Mutex::new(StateTracker::new()),
                event_tx: tx,
                handle: Mutex::new(None),
            }),
        };

        Ok((monitor, rx))
    }

    /// Start the poll loop
    ///
    /// Idempotent: if the loop is already running, the request is logged as
    /// a warning and the existing handle is returned — exactly one timer
    /// exists per monitor. After a shutdown, `start` may be called again.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Arc<MonitorHandle> {
        let mut slot = self.inner.handle.lock().unwrap();

        if let Some(existing) = slot.as_ref()
            && !existing.is_stopped()
        {
            warn!("door monitor already running, ignoring duplicate start request");
            return Arc::clone(existing);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run(shutdown_rx).await });

        let handle = Arc::new(MonitorHandle {
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            task: tokio::sync::Mutex::new(Some(task)),
            stopped: AtomicBool::new(false),
        });

        *slot = Some(Arc::clone(&handle));
        handle
    }

    /// Read-only copy of the tracker's current snapshot
    ///
    /// `None` until the first authoritative reading has been observed.
    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.inner.tracker.lock().unwrap().snapshot()
    }
}

impl MonitorInner {
    /// Main poll loop, running on its own task until shutdown
    async fn run(&self, mut shutdown_rx: oneshot::Receiver<()>) {
        info!(
            interval_secs = self.config.poll_interval_secs,
            sinks = self.sinks.len(),
            "door monitor started"
        );
        self.emit_event(MonitorEvent::Started {
            sink_count: self.sinks.len(),
        });

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        // One poll completes before the next starts; a slow iteration delays
        // the schedule instead of bursting.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }

                _ = &mut shutdown_rx => {
                    info!("shutdown requested, stopping door monitor");
                    self.emit_event(MonitorEvent::Stopped {
                        reason: "shutdown requested".to_string(),
                    });
                    break;
                }
            }
        }
    }

    /// One poll iteration: read, classify, track, fan out
    ///
    /// Never fails; every error path degrades to an `Unknown` reading or a
    /// logged sink outcome.
    async fn poll_once(&self) {
        let reading = match tokio::time::timeout(self.config.probe_timeout(), self.probe.read())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::probe(format!(
                "{} read timed out after {:?}",
                self.probe.probe_name(),
                self.config.probe_timeout()
            ))),
        };

        if let Err(e) = &reading {
            warn!(probe = self.probe.probe_name(), error = %e, "sensor read failed, observing unknown");
            self.emit_event(MonitorEvent::ProbeFailed {
                error: e.to_string(),
            });
        }

        let status = classify(reading);
        let event = self.tracker.lock().unwrap().observe(status);

        if let Some(event) = event {
            match event.previous {
                Some(previous) => {
                    info!(from = %previous, to = %event.next, "door status changed")
                }
                None => info!(status = %event.next, "initial door status"),
            }

            self.emit_event(MonitorEvent::TransitionDetected {
                event: event.clone(),
            });
            self.publish(&event).await;
        }
    }

    /// Fan a transition event out to every registered sink
    ///
    /// Sinks are invoked independently and sequentially, in registration
    /// order; a failure in one is logged and attributed to that sink only.
    /// Outcomes are aggregated for logging — there are no retries.
    async fn publish(&self, event: &TransitionEvent) {
        for sink in &self.sinks {
            let outcome = sink.deliver(event).await;

            match &outcome {
                DeliveryOutcome::Delivered => {
                    debug!(sink = sink.sink_name(), "sink delivery succeeded");
                }
                DeliveryOutcome::Skipped => {
                    debug!(sink = sink.sink_name(), "sink skipped event by policy");
                }
                DeliveryOutcome::Disabled => {
                    debug!(sink = sink.sink_name(), "sink disabled, event not delivered");
                }
                DeliveryOutcome::Failed(message) => {
                    error!(sink = sink.sink_name(), error = %message, "sink delivery failed");
                }
            }

            self.emit_event(MonitorEvent::SinkDelivered {
                sink: sink.sink_name(),
                outcome,
            });
        }
    }

    /// Emit a monitor event
    fn emit_event(&self, event: MonitorEvent) {
        // Send event, logging a warning if the channel is full. Dropping is
        // preferable to blocking the poll loop on a slow observer.
        if self.event_tx.try_send(event).is_err() {
            warn!("monitor event channel full, dropping event");
        }
    }
}
