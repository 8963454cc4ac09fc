//! Display client that maintains the push subscription to the relay.
//!
//! Owns the connection lifecycle: connect, subscribe, degrade to polling
//! on loss, reconnect after a fixed delay with exactly one attempt
//! outstanding at a time. The poll loop runs alongside for the whole
//! process lifetime so the display never goes dark.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Certificate, Channel, ClientTlsConfig};
use tonic::{Request, Streaming};
use tracing::{info, warn};

use wardrobe_proto::v1::display_service_client::DisplayServiceClient;
use wardrobe_proto::v1::{DeliveryMessage, DisplayFrame, Hello, Ping, display_frame};

use crate::config::DisplayConfig;
use crate::error::DisplayClientError;
use crate::phase::ConnectionPhase;
use crate::poller::PollLoop;
use crate::render::{RenderState, ResultSink};

/// Display client: push subscription plus poll fallback.
pub struct DisplayClient {
    config: DisplayConfig,
    render: Arc<Mutex<RenderState>>,
    sink: ResultSink,
}

impl DisplayClient {
    pub fn new(config: DisplayConfig) -> Self {
        let sink = ResultSink::new(config.output_dir.clone());
        Self {
            config,
            render: Arc::new(Mutex::new(RenderState::new())),
            sink,
        }
    }

    /// Run the display until shutdown.
    ///
    /// There is no terminal state short of shutdown: when reconnect
    /// attempts are capped and exhausted, the display stays in poll-only
    /// mode rather than exiting.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let poll_loop = PollLoop::new(
            self.config.clone(),
            Arc::clone(&self.render),
            self.sink.clone(),
        );
        let poll_shutdown = shutdown.clone();
        let poll_handle = tokio::spawn(async move {
            poll_loop.run(poll_shutdown).await;
        });

        let mut phase = ConnectionPhase::Connecting;
        let mut attempt: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = std::time::Instant::now();
            match self.connect_and_subscribe(&mut phase, &mut shutdown).await {
                Ok(()) => {
                    info!("Display client shutting down");
                    break;
                }
                Err(e) => {
                    phase = phase.on_channel_lost();

                    // Reset backoff if the subscription held for a while
                    if started.elapsed() > Duration::from_secs(60) {
                        attempt = 0;
                    }

                    if !self.config.reconnect.should_retry(attempt) {
                        warn!(
                            error = %e,
                            attempt,
                            "Reconnect attempts exhausted, continuing poll-only"
                        );
                        let _ = shutdown.changed().await;
                        break;
                    }

                    let delay = self.config.reconnect.delay_for_attempt(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "Push channel lost, reconnect scheduled"
                    );

                    if !reconnect_pause(delay, &mut shutdown).await {
                        break;
                    }
                    attempt = attempt.saturating_add(1);
                    phase = phase.on_retry_started();
                }
            }
        }

        // Every exit path releases the channel and pending timers; the
        // poll loop observes the same shutdown signal.
        poll_handle.abort();
    }

    /// Connect, send the identifying Hello, and pump the subscription.
    async fn connect_and_subscribe(
        &self,
        phase: &mut ConnectionPhase,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DisplayClientError> {
        let channel = connect_channel(&self.config).await?;
        let mut client = DisplayServiceClient::new(channel);

        let (frame_tx, frame_rx) = mpsc::channel::<DisplayFrame>(8);
        frame_tx
            .send(DisplayFrame {
                frame: Some(display_frame::Frame::Hello(Hello {
                    session_id: self.config.session_id.clone(),
                })),
            })
            .await
            .map_err(|_| DisplayClientError::Subscribe("Failed to queue hello frame".into()))?;

        let response = client
            .open_push_channel(Request::new(ReceiverStream::new(frame_rx)))
            .await
            .map_err(|e| DisplayClientError::Subscribe(e.to_string()))?;

        *phase = phase.on_channel_opened();
        info!(session_id = %self.config.session_id, "Subscribed to push channel");

        self.subscribe_loop(response.into_inner(), frame_tx, shutdown)
            .await
    }

    /// Pump inbound messages and keepalive pings until drop or shutdown.
    async fn subscribe_loop(
        &self,
        mut inbound: Streaming<DeliveryMessage>,
        frame_tx: mpsc::Sender<DisplayFrame>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DisplayClientError> {
        let mut ping_timer = tokio::time::interval(self.config.ping_interval);
        ping_timer.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                message = inbound.next() => {
                    match message {
                        Some(Ok(message)) => self.deliver(&message).await,
                        Some(Err(e)) => {
                            return Err(DisplayClientError::Stream(e.to_string()));
                        }
                        None => {
                            return Err(DisplayClientError::Connection(
                                "Stream ended by relay".into(),
                            ));
                        }
                    }
                }
                _ = ping_timer.tick() => {
                    let ping = DisplayFrame {
                        frame: Some(display_frame::Frame::Ping(Ping {})),
                    };
                    if frame_tx.send(ping).await.is_err() {
                        return Err(DisplayClientError::Connection(
                            "Outbound channel closed during ping".into(),
                        ));
                    }
                }
                _ = shutdown.changed() => {
                    info!("Display client received shutdown signal");
                    return Ok(());
                }
            }
        }
    }

    /// Apply one message atomically to the shared render state.
    async fn deliver(&self, message: &DeliveryMessage) {
        let mut render = self.render.lock().await;
        if render.apply(message) {
            if let Err(e) = self.sink.apply(render.scene()) {
                warn!(error = %e, "Failed to update display surface");
            }
        }
    }
}

/// Build a connected channel to the relay, with TLS for https URLs.
pub(crate) async fn connect_channel(config: &DisplayConfig) -> Result<Channel, DisplayClientError> {
    let mut endpoint = Channel::from_shared(config.relay_url.clone())
        .map_err(|e| DisplayClientError::Connection(e.to_string()))?
        .http2_keep_alive_interval(Duration::from_secs(30))
        .keep_alive_timeout(Duration::from_secs(10));

    if config.relay_url.starts_with("https://") {
        let mut tls_config = ClientTlsConfig::new().with_enabled_roots();
        if let Some(ca_path) = &config.ca_cert_path {
            let ca_pem = std::fs::read_to_string(ca_path).map_err(|e| {
                DisplayClientError::Connection(format!(
                    "Failed to read CA cert {}: {}",
                    ca_path.display(),
                    e
                ))
            })?;
            tls_config = tls_config.ca_certificate(Certificate::from_pem(ca_pem));
        }
        endpoint = endpoint
            .tls_config(tls_config)
            .map_err(|e| DisplayClientError::Connection(e.to_string()))?;
    }

    endpoint
        .connect()
        .await
        .map_err(|e| DisplayClientError::Connection(format!("{e}: {}", error_chain(&e))))
}

/// Wait out the reconnect delay, honouring shutdown. Returns `false` when
/// shutdown fired first; exactly one attempt follows a `true` return.
async fn reconnect_pause(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        () = sleep(delay) => true,
        _ = shutdown.changed() => {
            info!("Shutdown during reconnect wait");
            false
        }
    }
}

/// Walk the `source()` chain of an error and join into a single string.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(e) = current {
        chain.push(e.to_string());
        current = e.source();
    }
    if chain.is_empty() {
        String::from("(no further details)")
    } else {
        chain.join(" -> ")
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test(start_paused = true)]
    async fn reconnect_pause_waits_full_delay() {
        let (_tx, mut rx) = watch::channel(false);

        let wait = tokio::spawn(async move {
            reconnect_pause(Duration::from_secs(3), &mut rx).await
        });

        // Virtual time: the paused clock auto-advances past the sleep.
        assert!(wait.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_pause_aborts_on_shutdown() {
        let (tx, mut rx) = watch::channel(false);

        let wait = tokio::spawn(async move {
            reconnect_pause(Duration::from_secs(3600), &mut rx).await
        });

        tx.send(true).unwrap();
        assert!(!wait.await.unwrap());
    }

    #[tokio::test]
    async fn client_construction() {
        let config = DisplayConfig::new(
            "http://127.0.0.1:50051".into(),
            "kiosk-1".into(),
            PathBuf::from("/tmp/wardrobe-test"),
        );
        let client = DisplayClient::new(config);
        assert_eq!(client.config.session_id, "kiosk-1");
        assert_eq!(client.render.lock().await.last_version(), 0);
    }
}
