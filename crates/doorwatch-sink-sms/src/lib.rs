// # SMS Dispatch Sink
//
// This crate provides an SMS notification sink for the door monitor,
// dispatching a short status text to a static list of recipients via the
// Twilio Messages API.
//
// ## Behavior
//
// - One templated message per transition ("Garage door OPEN"/"Garage door
//   CLOSED"), attempted for every configured recipient independently
// - A failure for one recipient is logged (number masked) and does not stop
//   attempts to the rest
// - Overall outcome is `Delivered` iff at least one recipient send succeeded
// - Missing credentials or an empty recipient list is the valid, silent
//   disabled state: logged once at construction, every `deliver` then
//   reports `Disabled`
// - First-reading announcements are suppressed by default so a process
//   restart does not text every recipient the current state
//
// ## Architectural Constraints
//
// The sink is isolated and single-shot:
//
// - NO retry or backoff logic (the fan-out coordinator does not retry
//   either; at-least-once delivery comes from the door re-triggering)
// - NO background tasks; every send is bounded by the HTTP client timeout
// - NO access to monitor state beyond the delivered event
//
// ## Security
//
// The auth token NEVER appears in logs; recipient numbers are masked to
// their last four digits in log output.
//
// ## API Reference
//
// - Twilio Messages API: POST `/2010-04-01/Accounts/{AccountSid}/Messages.json`

use std::time::Duration;

use async_trait::async_trait;
use doorwatch_core::config::SmsConfig;
use doorwatch_core::state::{DoorState, TransitionEvent};
use doorwatch_core::traits::{DeliveryOutcome, NotifySink};
use doorwatch_core::{Error, Result};
use tracing::{debug, info, warn};

/// Twilio API base URL
const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Default HTTP timeout for carrier API requests; this also bounds each
/// per-recipient delivery attempt
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for the outbound message carrier
///
/// One call sends one text message. Implementations must not retry and must
/// bound every call with a timeout.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send one text message; returns the carrier message id
    async fn send(&self, to: &str, from: &str, body: &str) -> Result<String>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

/// Twilio REST transport
pub struct TwilioTransport {
    /// Twilio account SID
    account_sid: String,

    /// Twilio auth token
    /// ⚠️ NEVER log this value
    auth_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for TwilioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioTransport")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

impl TwilioTransport {
    /// Create a new Twilio transport
    ///
    /// # Security
    ///
    /// The auth token will NEVER be logged or displayed in error messages.
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Result<Self> {
        let account_sid = account_sid.into();
        let auth_token = auth_token.into();

        if account_sid.is_empty() || auth_token.is_empty() {
            return Err(Error::config("Twilio credentials cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            account_sid,
            auth_token,
            client,
        })
    }
}

#[async_trait]
impl SmsTransport for TwilioTransport {
    async fn send(&self, to: &str, from: &str, body: &str) -> Result<String> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE, self.account_sid
        );

        let params = [("To", to), ("From", from), ("Body", body)];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::transport(format!("carrier request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "carrier returned HTTP {}",
                status
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::transport(format!("invalid carrier response: {}", e)))?;

        let sid = payload
            .get("sid")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(sid)
    }

    fn transport_name(&self) -> &'static str {
        "twilio"
    }
}

/// SMS dispatch notification sink
///
/// Fans one transition event out to every configured recipient address.
/// The recipient list is fixed at construction; there is no runtime
/// mutation.
pub struct SmsSink {
    /// Carrier transport; `None` is the disabled state
    transport: Option<Box<dyn SmsTransport>>,

    /// Sender address
    from_number: String,

    /// Ordered recipient addresses
    recipients: Vec<String>,

    /// Forward first-reading announcements to recipients
    announce: bool,
}

impl SmsSink {
    /// Build a sink from configuration
    ///
    /// Incomplete configuration yields a disabled sink, not an error.
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        if !config.is_configured() {
            info!("SMS notifications disabled (missing configuration)");
            return Ok(Self::disabled());
        }

        let transport = TwilioTransport::new(&config.account_sid, &config.auth_token)?;
        info!(
            recipients = config.to_numbers.len(),
            "SMS notifications enabled"
        );

        Ok(Self {
            transport: Some(Box::new(transport)),
            from_number: config.from_number.clone(),
            recipients: config.to_numbers.clone(),
            announce: config.announce,
        })
    }

    /// Build a sink over an explicit transport (tests, custom carriers)
    pub fn with_transport(
        transport: Box<dyn SmsTransport>,
        from_number: impl Into<String>,
        recipients: Vec<String>,
        announce: bool,
    ) -> Self {
        Self {
            transport: Some(transport),
            from_number: from_number.into(),
            recipients,
            announce,
        }
    }

    /// A permanently disabled sink
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_number: String::new(),
            recipients: Vec::new(),
            announce: false,
        }
    }

    /// Whether the sink will attempt deliveries
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some() && !self.recipients.is_empty()
    }
}

/// Message body for a door state ("Garage door OPEN")
fn message_body(state: DoorState) -> String {
    format!("Garage door {}", state.as_str().to_uppercase())
}

/// Mask a phone number for logs, keeping the last four digits
fn mask_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{}", tail)
}

#[async_trait]
impl NotifySink for SmsSink {
    async fn deliver(&self, event: &TransitionEvent) -> DeliveryOutcome {
        let Some(transport) = &self.transport else {
            return DeliveryOutcome::Disabled;
        };
        if self.recipients.is_empty() {
            return DeliveryOutcome::Disabled;
        }

        if event.is_announcement() && !self.announce {
            debug!("suppressing first-reading announcement");
            return DeliveryOutcome::Skipped;
        }

        let body = message_body(event.next);
        let mut delivered = 0usize;

        for to in &self.recipients {
            match transport.send(to, &self.from_number, &body).await {
                Ok(sid) => {
                    info!(recipient = %mask_number(to), sid = %sid, "SMS sent");
                    delivered += 1;
                }
                Err(e) => {
                    warn!(recipient = %mask_number(to), error = %e, "failed to send SMS");
                }
            }
        }

        if delivered > 0 {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Failed(format!(
                "all {} recipient deliveries failed",
                self.recipients.len()
            ))
        }
    }

    fn sink_name(&self) -> &'static str {
        "sms"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorwatch_core::state::DoorState;
    use std::sync::Mutex;

    /// A transport that records calls and fails for listed recipients
    struct ScriptedTransport {
        failing_recipients: Vec<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(failing_recipients: &[&str]) -> Self {
            Self {
                failing_recipients: failing_recipients.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SmsTransport for ScriptedTransport {
        async fn send(&self, to: &str, _from: &str, body: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));

            if self.failing_recipients.iter().any(|r| r == to) {
                Err(Error::transport("scripted carrier failure"))
            } else {
                Ok(format!("SM{}", to.len()))
            }
        }

        fn transport_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn transition() -> TransitionEvent {
        TransitionEvent::new(Some(DoorState::Closed), DoorState::Open)
    }

    fn recipients() -> Vec<String> {
        vec![
            "+15551230001".to_string(),
            "+15551230002".to_string(),
            "+15551230003".to_string(),
        ]
    }

    /// Wrapper so a test can keep inspecting a transport after handing it
    /// to the sink
    struct SharedTransport(std::sync::Arc<ScriptedTransport>);

    #[async_trait]
    impl SmsTransport for SharedTransport {
        async fn send(&self, to: &str, from: &str, body: &str) -> Result<String> {
            self.0.send(to, from, body).await
        }

        fn transport_name(&self) -> &'static str {
            self.0.transport_name()
        }
    }

    #[tokio::test]
    async fn one_recipient_failure_does_not_stop_the_rest() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(&["+15551230002"]));
        let sink = SmsSink::with_transport(
            Box::new(SharedTransport(transport.clone())),
            "+15550000000",
            recipients(),
            false,
        );

        let outcome = sink.deliver(&transition()).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::Delivered,
            "at least one success means success"
        );

        let calls = transport.calls.lock().unwrap();
        let attempted: Vec<&str> = calls.iter().map(|(to, _)| to.as_str()).collect();
        assert_eq!(
            attempted,
            vec!["+15551230001", "+15551230002", "+15551230003"],
            "recipients #1 and #3 must be attempted despite #2 failing"
        );
    }

    #[tokio::test]
    async fn all_failures_yield_a_failed_outcome() {
        let sink = SmsSink::with_transport(
            Box::new(ScriptedTransport::new(&[
                "+15551230001",
                "+15551230002",
                "+15551230003",
            ])),
            "+15550000000",
            recipients(),
            false,
        );

        let outcome = sink.deliver(&transition()).await;
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn unconfigured_sink_is_disabled_not_an_error() {
        let sink = SmsSink::from_config(&SmsConfig::default()).unwrap();
        assert!(!sink.is_enabled());

        let outcome = sink.deliver(&transition()).await;
        assert_eq!(outcome, DeliveryOutcome::Disabled);
    }

    #[tokio::test]
    async fn announcements_are_suppressed_by_default() {
        let transport = std::sync::Arc::new(ScriptedTransport::new(&[]));
        let sink = SmsSink::with_transport(
            Box::new(SharedTransport(transport.clone())),
            "+15550000000",
            recipients(),
            false,
        );

        let announcement = TransitionEvent::new(None, DoorState::Closed);
        assert_eq!(sink.deliver(&announcement).await, DeliveryOutcome::Skipped);
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn announcements_can_be_opted_in() {
        let sink = SmsSink::with_transport(
            Box::new(ScriptedTransport::new(&[])),
            "+15550000000",
            recipients(),
            true,
        );

        let announcement = TransitionEvent::new(None, DoorState::Closed);
        assert_eq!(sink.deliver(&announcement).await, DeliveryOutcome::Delivered);
    }

    #[test]
    fn message_body_is_ascii_and_names_the_state() {
        assert_eq!(message_body(DoorState::Open), "Garage door OPEN");
        assert_eq!(message_body(DoorState::Closed), "Garage door CLOSED");
        assert!(message_body(DoorState::Open).is_ascii());
    }

    #[test]
    fn phone_numbers_are_masked_in_logs() {
        assert_eq!(mask_number("+15551237890"), "***7890");
        assert_eq!(mask_number("123"), "****");
    }

    #[test]
    fn debug_output_redacts_the_auth_token() {
        let transport = TwilioTransport::new("AC123", "super-secret").unwrap();
        let debug = format!("{:?}", transport);
        assert!(debug.contains("<REDACTED>"));
        assert!(!debug.contains("super-secret"));
    }
}
