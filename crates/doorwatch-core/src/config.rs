//! Configuration types for the door monitor
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main doorwatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorwatchConfig {
    /// Door probe configuration
    pub probe: ProbeConfig,

    /// SMS dispatch configuration (may be unconfigured; the sink then runs
    /// in its disabled state)
    #[serde(default)]
    pub sms: SmsConfig,

    /// Poll loop settings
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl DoorwatchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.probe.validate()?;
        self.sms.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}

/// Door probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeConfig {
    /// GPIO input read via a sysfs value file (Linux)
    Gpio {
        /// Path to the exported GPIO value file
        /// (e.g., "/sys/class/gpio/gpio26/value")
        value_path: String,
    },

    /// External sensor command run once per poll
    Command {
        /// Command line to execute (stdout is parsed for the door state)
        command: String,
    },
}

impl ProbeConfig {
    /// Validate the probe configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProbeConfig::Gpio { value_path } => {
                if value_path.is_empty() {
                    return Err(crate::Error::config("GPIO value path cannot be empty"));
                }
                Ok(())
            }
            ProbeConfig::Command { command } => {
                if command.trim().is_empty() {
                    return Err(crate::Error::config("probe command cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

/// SMS dispatch sink configuration
///
/// The sink is enabled only when every credential field and at least one
/// recipient are present. Anything less is the valid disabled state, not a
/// configuration error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Carrier account identifier
    #[serde(default)]
    pub account_sid: String,

    /// Carrier auth token (never logged)
    #[serde(default)]
    pub auth_token: String,

    /// Sender phone number
    #[serde(default)]
    pub from_number: String,

    /// Ordered recipient phone numbers
    #[serde(default)]
    pub to_numbers: Vec<String>,

    /// Forward the first-reading announcement to recipients
    ///
    /// Off by default so every process restart does not text everyone the
    /// current state.
    #[serde(default)]
    pub announce: bool,
}

impl SmsConfig {
    /// Whether all required transport credentials and recipients are present
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty()
            && !self.auth_token.is_empty()
            && !self.from_number.is_empty()
            && !self.to_numbers.is_empty()
    }

    /// Parse an ordered, comma-delimited recipient list
    pub fn parse_recipients(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate the SMS configuration
    ///
    /// Only checks number shape when the sink is configured at all.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.is_configured() {
            return Ok(());
        }

        for number in std::iter::once(&self.from_number).chain(self.to_numbers.iter()) {
            validate_phone_number(number)?;
        }

        Ok(())
    }
}

/// Basic E.164-ish phone number shape check
fn validate_phone_number(number: &str) -> Result<(), crate::Error> {
    let digits = number.strip_prefix('+').unwrap_or(number);
    if digits.is_empty() || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(crate::Error::config(format!(
            "invalid phone number '{}': expected +<country code><digits>",
            number
        )));
    }
    Ok(())
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between sensor polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Bound on a single probe read (seconds); a timed-out read is treated
    /// as an `Unknown` reading for that poll
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Capacity of the monitor event channel
    ///
    /// When full, new monitor events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Validate the poll loop configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(1..=3600).contains(&self.poll_interval_secs) {
            return Err(crate::Error::config(format!(
                "poll interval must be between 1 and 3600 seconds, got {}",
                self.poll_interval_secs
            )));
        }
        if !(1..=300).contains(&self.probe_timeout_secs) {
            return Err(crate::Error::config(format!(
                "probe timeout must be between 1 and 300 seconds, got {}",
                self.probe_timeout_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = MonitorConfig {
            poll_interval_secs: 0,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn recipient_list_is_ordered_and_trimmed() {
        let recipients = SmsConfig::parse_recipients(" +15551230001, +15551230002 ,,+15551230003");
        assert_eq!(
            recipients,
            vec!["+15551230001", "+15551230002", "+15551230003"]
        );
    }

    #[test]
    fn partial_sms_config_is_unconfigured_not_invalid() {
        let config = SmsConfig {
            account_sid: "AC0123456789".to_string(),
            ..SmsConfig::default()
        };
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn configured_sms_requires_plausible_numbers() {
        let config = SmsConfig {
            account_sid: "AC0123456789".to_string(),
            auth_token: "token-value-long-enough".to_string(),
            from_number: "not-a-number".to_string(),
            to_numbers: vec!["+15551230001".to_string()],
            announce: false,
        };
        assert!(config.validate().is_err());
    }
}
