//! Connection phase state machine for the display.
//!
//! The display runs indefinitely; there is no terminal phase. Push loss is
//! never user-visible as an error: the poll loop keeps the surface lit
//! while the run loop schedules exactly one reconnect attempt at a time.

use tracing::{debug, warn};

/// Display connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Initial connect attempt in progress.
    Connecting,
    /// Push channel open; low-latency delivery.
    Subscribed,
    /// Push unavailable; polling is the active delivery path.
    Degraded,
    /// The scheduled reconnect attempt is in flight.
    Reconnecting,
}

impl ConnectionPhase {
    /// The push channel opened successfully.
    pub fn on_channel_opened(self) -> Self {
        match self {
            Self::Connecting | Self::Reconnecting => {
                debug!(from = ?self, "Phase -> Subscribed");
                Self::Subscribed
            }
            other => {
                warn!(phase = ?other, "Unexpected channel open ignored");
                other
            }
        }
    }

    /// The push channel closed, errored, or failed to open.
    pub fn on_channel_lost(self) -> Self {
        if self != Self::Degraded {
            debug!(from = ?self, "Phase -> Degraded");
        }
        Self::Degraded
    }

    /// The fixed-delay timer fired and a reconnect attempt is starting.
    /// Only legal from `Degraded`: overlapping attempts are forbidden.
    pub fn on_retry_started(self) -> Self {
        match self {
            Self::Degraded => {
                debug!("Phase -> Reconnecting");
                Self::Reconnecting
            }
            other => {
                warn!(phase = ?other, "Retry without degraded phase ignored");
                other
            }
        }
    }

    /// Whether push delivery is currently live.
    pub fn is_subscribed(self) -> bool {
        self == Self::Subscribed
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::ConnectionPhase::{Connecting, Degraded, Reconnecting, Subscribed};

    #[test]
    fn initial_connect_success() {
        assert_eq!(Connecting.on_channel_opened(), Subscribed);
    }

    #[test]
    fn initial_connect_failure_degrades() {
        assert_eq!(Connecting.on_channel_lost(), Degraded);
    }

    #[test]
    fn subscribed_drop_degrades() {
        assert_eq!(Subscribed.on_channel_lost(), Degraded);
    }

    #[test]
    fn degraded_retry_then_resubscribe() {
        let phase = Degraded.on_retry_started();
        assert_eq!(phase, Reconnecting);
        assert_eq!(phase.on_channel_opened(), Subscribed);
    }

    #[test]
    fn failed_retry_degrades_again() {
        assert_eq!(Reconnecting.on_channel_lost(), Degraded);
    }

    #[test]
    fn retry_is_only_legal_from_degraded() {
        assert_eq!(Subscribed.on_retry_started(), Subscribed);
        assert_eq!(Connecting.on_retry_started(), Connecting);
        assert_eq!(Reconnecting.on_retry_started(), Reconnecting);
    }

    #[test]
    fn open_while_subscribed_is_ignored() {
        assert_eq!(Subscribed.on_channel_opened(), Subscribed);
    }

    #[test]
    fn subscribed_reports_live_push() {
        assert!(Subscribed.is_subscribed());
        assert!(!Degraded.is_subscribed());
        assert!(!Connecting.is_subscribed());
        assert!(!Reconnecting.is_subscribed());
    }
}
