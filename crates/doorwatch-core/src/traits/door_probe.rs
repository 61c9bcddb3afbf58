// # Door Probe Trait
//
// Defines the interface for reading the door position switch.
//
// ## Implementations
//
// - GPIO input (Linux sysfs): `doorwatch-probe-gpio` crate
// - External sensor command: `doorwatch-probe-gpio` crate (`CommandProbe`)
//
// ## Usage
//
// ```rust,ignore
// use doorwatch_core::DoorProbe;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let probe = /* DoorProbe implementation */;
//
//     match probe.read().await {
//         Ok(reading) => println!("switch: {:?}", reading),
//         Err(e) => eprintln!("probe failed: {}", e),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::state::RawReading;

/// Trait for door probe implementations
///
/// A probe performs one bounded hardware read per invocation and reports
/// either the switch level or an error. It is an **observer**, not a
/// decision-maker:
///
/// - It must not cache readings or debounce (owned by `StateTracker`)
/// - It must not retry (a failed read becomes `Unknown` for that poll)
/// - It must not spawn tasks or own timers (scheduling is owned by
///   `DoorMonitor`)
///
/// The poll loop wraps every `read()` call in a timeout, so implementations
/// need not enforce their own deadline, but each call should still be a
/// single short I/O operation.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DoorProbe: Send + Sync {
    /// Read the door position switch once
    ///
    /// # Returns
    ///
    /// - `Ok(RawReading)`: The current switch level
    /// - `Err(Error)`: Hardware missing or read failure (classified to
    ///   `Unknown` by the caller, never fatal)
    async fn read(&self) -> Result<RawReading>;

    /// Get the probe name (for logging/debugging)
    fn probe_name(&self) -> &'static str;
}
