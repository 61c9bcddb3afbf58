// # doorwatchd - Door Monitor Daemon
//
// The doorwatchd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Wiring the probe and notification sinks into the monitor
// 4. Starting the poll loop and waiting for shutdown signals
//
// This is a thin integration layer: all monitoring logic lives in
// doorwatch-core, the sensor binding in doorwatch-probe-gpio, and the SMS
// carrier integration in doorwatch-sink-sms.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Probe
// - `DOORWATCH_PROBE_TYPE`: Probe type (gpio, command; default gpio)
// - `DOORWATCH_GPIO_VALUE_PATH`: Sysfs value file for the door switch input
// - `DOORWATCH_PROBE_COMMAND`: Sensor command line (for command probe)
//
// ### Poll loop
// - `DOOR_MONITOR_INTERVAL`: Seconds between polls (default 5)
// - `DOORWATCH_PROBE_TIMEOUT`: Per-read timeout in seconds (default 10)
//
// ### SMS dispatch (all required for the sink to be enabled)
// - `TWILIO_ACCOUNT_SID`: Carrier account SID
// - `TWILIO_AUTH_TOKEN`: Carrier auth token
// - `TWILIO_FROM_PHONE`: Sender phone number
// - `TWILIO_TO_PHONES`: Comma-separated recipient phone numbers
// - `DOORWATCH_SMS_ANNOUNCE`: Also text the first reading after start
//   (true/false, default false)
//
// ### Logging
// - `DOORWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DOORWATCH_GPIO_VALUE_PATH=/sys/class/gpio/gpio26/value
// export DOOR_MONITOR_INTERVAL=5
// export TWILIO_ACCOUNT_SID=ACxxxxxxxx
// export TWILIO_AUTH_TOKEN=xxxxxxxx
// export TWILIO_FROM_PHONE=+15550001111
// export TWILIO_TO_PHONES=+15550002222,+15550003333
//
// doorwatchd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use doorwatch_core::config::{MonitorConfig, ProbeConfig, SmsConfig};
use doorwatch_core::traits::NotifySink;
use doorwatch_core::{BroadcastSink, DoorMonitor, DoorwatchConfig, MonitorEvent};
use doorwatch_probe_gpio::{CommandProbe, GpioProbe};
use doorwatch_sink_sms::SmsSink;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default sysfs value file for the door switch input
const DEFAULT_GPIO_VALUE_PATH: &str = "/sys/class/gpio/gpio26/value";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DoorwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DoorwatchExitCode> for ExitCode {
    fn from(code: DoorwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    probe_type: String,
    gpio_value_path: String,
    probe_command: Option<String>,
    poll_interval_secs: u64,
    probe_timeout_secs: u64,
    twilio_account_sid: String,
    twilio_auth_token: String,
    twilio_from_phone: String,
    twilio_to_phones: Vec<String>,
    sms_announce: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            probe_type: env::var("DOORWATCH_PROBE_TYPE").unwrap_or_else(|_| "gpio".to_string()),
            gpio_value_path: env::var("DOORWATCH_GPIO_VALUE_PATH")
                .unwrap_or_else(|_| DEFAULT_GPIO_VALUE_PATH.to_string()),
            probe_command: env::var("DOORWATCH_PROBE_COMMAND").ok(),
            poll_interval_secs: env::var("DOOR_MONITOR_INTERVAL")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("DOOR_MONITOR_INTERVAL must be a number: {}", e))?
                .unwrap_or(5),
            probe_timeout_secs: env::var("DOORWATCH_PROBE_TIMEOUT")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("DOORWATCH_PROBE_TIMEOUT must be a number: {}", e))?
                .unwrap_or(10),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_from_phone: env::var("TWILIO_FROM_PHONE").unwrap_or_default(),
            twilio_to_phones: SmsConfig::parse_recipients(
                &env::var("TWILIO_TO_PHONES").unwrap_or_default(),
            ),
            sms_announce: matches!(
                env::var("DOORWATCH_SMS_ANNOUNCE").as_deref(),
                Ok("1") | Ok("true") | Ok("yes")
            ),
            log_level: env::var("DOORWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Missing SMS credentials are NOT an error: the dispatch sink then
    /// runs in its disabled state. Everything else gets an operator-facing
    /// message naming the env var to fix.
    fn validate(&self) -> Result<()> {
        match self.probe_type.as_str() {
            "gpio" => {
                if self.gpio_value_path.is_empty() {
                    anyhow::bail!(
                        "DOORWATCH_GPIO_VALUE_PATH cannot be empty when DOORWATCH_PROBE_TYPE=gpio"
                    );
                }
            }
            "command" => {
                if self
                    .probe_command
                    .as_ref()
                    .is_none_or(|c| c.trim().is_empty())
                {
                    anyhow::bail!(
                        "DOORWATCH_PROBE_COMMAND is required when DOORWATCH_PROBE_TYPE=command"
                    );
                }
            }
            other => anyhow::bail!(
                "DOORWATCH_PROBE_TYPE '{}' is not supported. Supported types: gpio, command",
                other
            ),
        }

        if !(1..=3600).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "DOOR_MONITOR_INTERVAL must be between 1 and 3600 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if !(1..=300).contains(&self.probe_timeout_secs) {
            anyhow::bail!(
                "DOORWATCH_PROBE_TIMEOUT must be between 1 and 300 seconds. Got: {}",
                self.probe_timeout_secs
            );
        }

        // Catch obvious placeholder credentials (common mistake) before the
        // sink silently "works" against the carrier sandbox.
        if !self.twilio_auth_token.is_empty() {
            let token_lower = self.twilio_auth_token.to_lowercase();
            if token_lower.contains("your_token")
                || token_lower.contains("replace_me")
                || token_lower.contains("example")
            {
                anyhow::bail!(
                    "TWILIO_AUTH_TOKEN appears to be a placeholder. \
                    Use an actual auth token from your carrier console."
                );
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DOORWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        // Cross-crate checks (phone number shape) run here too so every
        // configuration failure exits with the config error code.
        self.to_doorwatch_config().validate()?;

        Ok(())
    }

    /// Assemble the core configuration
    fn to_doorwatch_config(&self) -> DoorwatchConfig {
        let probe = match self.probe_type.as_str() {
            "command" => ProbeConfig::Command {
                command: self.probe_command.clone().unwrap_or_default(),
            },
            _ => ProbeConfig::Gpio {
                value_path: self.gpio_value_path.clone(),
            },
        };

        DoorwatchConfig {
            probe,
            sms: SmsConfig {
                account_sid: self.twilio_account_sid.clone(),
                auth_token: self.twilio_auth_token.clone(),
                from_number: self.twilio_from_phone.clone(),
                to_numbers: self.twilio_to_phones.clone(),
                announce: self.sms_announce,
            },
            monitor: MonitorConfig {
                poll_interval_secs: self.poll_interval_secs,
                probe_timeout_secs: self.probe_timeout_secs,
                ..MonitorConfig::default()
            },
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DoorwatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DoorwatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DoorwatchExitCode::ConfigError.into();
    }

    info!("Starting doorwatchd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DoorwatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DoorwatchExitCode::RuntimeError
        } else {
            DoorwatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let doorwatch_config = config.to_doorwatch_config();

    // Build the probe
    let probe: Box<dyn doorwatch_core::DoorProbe> = match &doorwatch_config.probe {
        ProbeConfig::Gpio { value_path } => {
            info!("Probe: GPIO input at {}", value_path);
            Box::new(GpioProbe::new(value_path.clone()))
        }
        ProbeConfig::Command { command } => {
            info!("Probe: sensor command '{}'", command);
            Box::new(CommandProbe::new(command)?)
        }
    };

    // Build the sinks. The broadcast sink is always registered so a
    // transport layer can attach subscribers; the SMS sink registers even
    // when unconfigured (it reports Disabled per event).
    let broadcast = Arc::new(BroadcastSink::new());
    let sms = Arc::new(SmsSink::from_config(&doorwatch_config.sms)?);

    let sinks: Vec<Arc<dyn NotifySink>> = vec![broadcast, sms];

    let (monitor, mut event_rx) =
        DoorMonitor::new(probe, sinks, doorwatch_config.monitor.clone())?;

    // Surface monitor events in the daemon log
    let observer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                MonitorEvent::Started { sink_count } => {
                    info!(sinks = sink_count, "monitor started");
                }
                MonitorEvent::Stopped { reason } => {
                    info!(%reason, "monitor stopped");
                }
                other => debug!(?other, "monitor event"),
            }
        }
    });

    let handle = monitor.start();
    info!(
        interval_secs = doorwatch_config.monitor.poll_interval_secs,
        "Door status monitor started"
    );

    // Wait for shutdown signal
    let signal_name = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal_name);

    handle.shutdown().await;
    observer.abort();

    info!("Daemon stopped cleanly");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
