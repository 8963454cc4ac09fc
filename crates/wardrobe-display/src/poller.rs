//! Poll-mode delivery loop.
//!
//! A display with no live push channel probes the relay on a fixed
//! interval and fetches the artifact only when the version advanced. The
//! loop also runs while subscribed: its reads are side-effect free and the
//! shared render state drops anything the push path already applied.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tonic::transport::Channel;
use tracing::{debug, warn};

use wardrobe_proto::v1::display_service_client::DisplayServiceClient;
use wardrobe_proto::v1::{FetchLatestRequest, PollStatusRequest};

use crate::client::connect_channel;
use crate::config::DisplayConfig;
use crate::error::DisplayClientError;
use crate::render::{RenderState, ResultSink};

/// Version gate for poll-mode change detection.
///
/// Strictly-greater comparison: a probe equal to or below the last fetched
/// version is the expected steady state, not a reason to fetch.
#[derive(Debug, Default)]
pub struct PollTracker {
    last_seen: u64,
}

impl PollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a probe result warrants fetching the artifact.
    pub fn observe(&self, probed: u64) -> bool {
        probed > self.last_seen
    }

    /// Record a successfully fetched version.
    pub fn caught_up(&mut self, version: u64) {
        self.last_seen = self.last_seen.max(version);
    }
}

/// Interval-driven poll loop sharing the display's render state.
pub struct PollLoop {
    config: DisplayConfig,
    render: Arc<Mutex<RenderState>>,
    sink: ResultSink,
}

impl PollLoop {
    pub fn new(config: DisplayConfig, render: Arc<Mutex<RenderState>>, sink: ResultSink) -> Self {
        Self {
            config,
            render,
            sink,
        }
    }

    /// Poll until shutdown. Transport errors are absorbed: the client is
    /// dropped and lazily reconnected on a later tick, so a flaky network
    /// can never kill the fallback path.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut tracker = PollTracker::new();
        let mut client: Option<DisplayServiceClient<Channel>> = None;
        let mut interval = tokio::time::interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    debug!("Poll loop shutting down");
                    return;
                }
            }

            if let Err(e) = self.poll_once(&mut client, &mut tracker).await {
                debug!(error = %e, "Poll attempt failed");
                client = None;
            }
        }
    }

    async fn poll_once(
        &self,
        client: &mut Option<DisplayServiceClient<Channel>>,
        tracker: &mut PollTracker,
    ) -> Result<(), DisplayClientError> {
        if client.is_none() {
            let channel = connect_channel(&self.config).await?;
            *client = Some(DisplayServiceClient::new(channel));
        }
        let Some(svc) = client.as_mut() else {
            return Ok(());
        };

        let session_id = self.config.session_id.clone();
        let version = svc
            .poll_status(PollStatusRequest {
                session_id: session_id.clone(),
            })
            .await
            .map_err(|e| DisplayClientError::Connection(e.to_string()))?
            .into_inner()
            .version;

        if !tracker.observe(version) {
            return Ok(());
        }

        let response = svc
            .fetch_latest(FetchLatestRequest { session_id })
            .await
            .map_err(|e| DisplayClientError::Connection(e.to_string()))?
            .into_inner();

        if let Some(message) = response.message {
            tracker.caught_up(message.version);
            let mut render = self.render.lock().await;
            if render.apply(&message) {
                if let Err(e) = self.sink.apply(render.scene()) {
                    warn!(error = %e, "Failed to update display surface");
                }
            }
        }
        Ok(())
    }
}
