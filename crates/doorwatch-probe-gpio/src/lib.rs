// # Door Position Switch Probes
//
// This crate provides `DoorProbe` implementations for the door monitor.
//
// ## Implementations
//
// - **GpioProbe**: reads an exported GPIO input via its sysfs value file.
//   This is the native path on a Raspberry Pi style deployment where the
//   door switch is wired to a digital input.
// - **CommandProbe**: runs an external sensor command once per poll and
//   parses its stdout. This is the fallback path when the sensor is only
//   reachable through a vendor helper tool.
//
// ## Contract
//
// Probes are observers: one bounded read per invocation, no caching, no
// debouncing, no retry. A failed read is reported as an error and becomes
// an `Unknown` reading for that poll iteration; the monitor keeps polling.

use async_trait::async_trait;
use doorwatch_core::state::RawReading;
use doorwatch_core::traits::DoorProbe;
use doorwatch_core::{Error, Result};
use tracing::debug;

/// GPIO probe reading a sysfs value file
///
/// The switch is wired normally-open and pulled low: the input reads `1`
/// when the door presses the switch closed, `0` when the door is open.
#[derive(Debug, Clone)]
pub struct GpioProbe {
    /// Path to the exported GPIO value file
    /// (e.g., "/sys/class/gpio/gpio26/value")
    value_path: String,
}

impl GpioProbe {
    /// Create a probe over an exported GPIO value file
    pub fn new(value_path: impl Into<String>) -> Self {
        Self {
            value_path: value_path.into(),
        }
    }
}

#[async_trait]
impl DoorProbe for GpioProbe {
    async fn read(&self) -> Result<RawReading> {
        let raw = tokio::fs::read_to_string(&self.value_path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::probe(format!("GPIO input not found: {}", self.value_path))
                } else {
                    Error::probe(format!("failed to read {}: {}", self.value_path, e))
                }
            })?;

        match raw.trim() {
            "1" => Ok(RawReading::Active),
            "0" => Ok(RawReading::Inactive),
            other => Err(Error::probe(format!(
                "unexpected GPIO value '{}' in {}",
                other, self.value_path
            ))),
        }
    }

    fn probe_name(&self) -> &'static str {
        "gpio"
    }
}

/// Probe that shells out to an external sensor command
///
/// The command's stdout is expected to contain `Door Closed` or
/// `Door Opened`; anything else (including a non-zero exit) is a read
/// failure. The monitor's probe timeout bounds the whole invocation.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    /// Create a probe from a whitespace-separated command line
    pub fn new(command: impl AsRef<str>) -> Result<Self> {
        let mut parts = command.as_ref().split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::config("probe command cannot be empty"))?
            .to_string();
        let args = parts.map(|s| s.to_string()).collect();

        Ok(Self { program, args })
    }
}

#[async_trait]
impl DoorProbe for CommandProbe {
    async fn read(&self) -> Result<RawReading> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| Error::probe(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::probe(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(command = %self.program, output = %stdout.trim(), "sensor command completed");

        if stdout.contains("Door Closed") {
            Ok(RawReading::Active)
        } else if stdout.contains("Door Opened") {
            Ok(RawReading::Inactive)
        } else {
            Err(Error::probe(format!(
                "unrecognized sensor output: {}",
                stdout.trim()
            )))
        }
    }

    fn probe_name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn value_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[tokio::test]
    async fn gpio_high_reads_active() {
        let file = value_file("1\n");
        let probe = GpioProbe::new(file.path().to_string_lossy());
        assert_eq!(probe.read().await.unwrap(), RawReading::Active);
    }

    #[tokio::test]
    async fn gpio_low_reads_inactive() {
        let file = value_file("0\n");
        let probe = GpioProbe::new(file.path().to_string_lossy());
        assert_eq!(probe.read().await.unwrap(), RawReading::Inactive);
    }

    #[tokio::test]
    async fn gpio_garbage_is_a_read_failure() {
        let file = value_file("not-a-level\n");
        let probe = GpioProbe::new(file.path().to_string_lossy());
        assert!(probe.read().await.is_err());
    }

    #[tokio::test]
    async fn missing_gpio_is_a_read_failure_not_a_panic() {
        let probe = GpioProbe::new("/nonexistent/gpio/value");
        let err = probe.read().await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn command_probe_parses_closed_output() {
        let probe = CommandProbe::new("echo Door Closed").unwrap();
        assert_eq!(probe.read().await.unwrap(), RawReading::Active);
    }

    #[tokio::test]
    async fn command_probe_parses_opened_output() {
        let probe = CommandProbe::new("echo Door Opened").unwrap();
        assert_eq!(probe.read().await.unwrap(), RawReading::Inactive);
    }

    #[tokio::test]
    async fn unrecognized_command_output_is_a_read_failure() {
        let probe = CommandProbe::new("echo Automation HAT not found").unwrap();
        assert!(probe.read().await.is_err());
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandProbe::new("   ").is_err());
    }
}
