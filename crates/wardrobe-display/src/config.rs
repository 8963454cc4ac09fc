//! Display client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the display's connection to the relay.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Relay server URL (e.g., "http://stall-relay.local:50051").
    pub relay_url: String,

    /// Session this display surface serves. Opaque, URL-safe, unique per
    /// active display; input devices target the same id.
    pub session_id: String,

    /// Directory the kiosk surface reads rendered images from.
    pub output_dir: PathBuf,

    /// Poll-mode probe interval.
    pub poll_interval: Duration,

    /// Keepalive ping interval on the push channel.
    pub ping_interval: Duration,

    /// Reconnection policy.
    pub reconnect: ReconnectPolicy,

    /// Path to CA certificate for verifying the relay's TLS certificate.
    pub ca_cert_path: Option<PathBuf>,
}

/// Reconnection policy for the push channel.
///
/// The default is a fixed 3-second delay with unlimited attempts: a kiosk
/// never gives up, and only one attempt is ever outstanding. The
/// initial/multiplier/cap form is kept so operators can configure
/// exponential backoff against a remote relay.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,
    /// Maximum delay between reconnect attempts.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// Maximum number of reconnect attempts (None = unlimited).
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(3),
            multiplier: 1.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// Whether another attempt should be made.
    pub fn should_retry(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

impl DisplayConfig {
    /// Create a display config with required fields and defaults.
    pub fn new(relay_url: String, session_id: String, output_dir: PathBuf) -> Self {
        Self {
            relay_url,
            session_id,
            output_dir,
            poll_interval: Duration::from_secs(3),
            ping_interval: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
            ca_cert_path: None,
        }
    }
}
