//! In-memory session registry for display delivery.
//!
//! Each session owns the latest-artifact slot (poll mode) and at most one
//! attached push channel. `write_result` always writes the slot and, when a
//! channel is attached, enqueues the same message to it, so the two delivery
//! paths can never diverge: a display that misses a push still finds the
//! message on its next poll.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use wardrobe_proto::v1::{DeliveryMessage, delivery_message::Payload};

/// Queue depth of an attached push channel. A display that falls this far
/// behind is effectively gone; it gets detached and picked back up by its
/// poll loop.
pub const PUSH_CHANNEL_CAPACITY: usize = 32;

/// An attached push channel, tagged with the epoch it was attached under.
struct PushChannel {
    epoch: u64,
    tx: mpsc::Sender<DeliveryMessage>,
}

/// Mutable per-session state, serialized behind the session's own mutex.
/// Sessions never contend with each other.
struct SessionState {
    push: Option<PushChannel>,
    slot: Option<DeliveryMessage>,
    version: u64,
    next_epoch: u64,
    job_in_flight: bool,
    last_activity: Instant,
}

/// One display session: a logical pairing between an input device and a
/// display surface.
struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: Mutex::new(SessionState {
                push: None,
                slot: None,
                version: 0,
                next_epoch: 0,
                job_in_flight: false,
                last_activity: Instant::now(),
            }),
        }
    }
}

/// Thread-safe registry of display sessions. Exclusively owns all session
/// records; created lazily on first write or push attach.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn get_or_create(&self, session_id: &str) -> Arc<Session> {
        if let Some(session) = self.get(session_id).await {
            return session;
        }
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return Arc::clone(session);
        }
        let session = Arc::new(Session::new());
        sessions.insert(session_id.to_string(), Arc::clone(&session));
        info!(session_id = %session_id, "Session created");
        session
    }

    /// Attach a push channel for a session, replacing any prior channel.
    ///
    /// Dropping the replaced sender ends the evicted display's stream.
    /// Returns the attach epoch; `detach_push` with a stale epoch is a
    /// no-op, so a replaced channel's teardown cannot evict its successor.
    #[allow(clippy::significant_drop_tightening)]
    pub async fn attach_push(&self, session_id: &str, tx: mpsc::Sender<DeliveryMessage>) -> u64 {
        let session = self.get_or_create(session_id).await;
        let mut state = session.state.lock().await;
        state.next_epoch += 1;
        let epoch = state.next_epoch;
        if state.push.is_some() {
            info!(session_id = %session_id, epoch, "Replacing existing push channel");
        } else {
            info!(session_id = %session_id, epoch, "Push channel attached");
        }
        state.push = Some(PushChannel { epoch, tx });
        state.last_activity = Instant::now();
        epoch
    }

    /// Detach the push channel attached under `epoch`. Returns whether a
    /// channel was actually removed.
    #[allow(clippy::significant_drop_tightening)]
    pub async fn detach_push(&self, session_id: &str, epoch: u64) -> bool {
        let Some(session) = self.get(session_id).await else {
            return false;
        };
        let mut state = session.state.lock().await;
        match &state.push {
            Some(push) if push.epoch == epoch => {
                state.push = None;
                info!(session_id = %session_id, epoch, "Push channel detached");
                true
            }
            _ => {
                debug!(session_id = %session_id, epoch, "Stale detach ignored");
                false
            }
        }
    }

    /// Record the next delivery message for a session.
    ///
    /// Under the session lock: bump the version, stamp the message, store it
    /// in the poll slot, and enqueue it to the push channel when one is
    /// attached. The dual write under one lock closes the attach/write race
    /// described in the ordering guarantee: no interleaving can drop a
    /// message from both paths.
    ///
    /// A full or closed push queue detaches the channel; the slot already
    /// holds the message, so the display recovers it by polling.
    #[allow(clippy::significant_drop_tightening)]
    pub async fn write_result(&self, session_id: &str, payload: Payload) -> DeliveryMessage {
        let session = self.get_or_create(session_id).await;
        let mut state = session.state.lock().await;
        state.version += 1;
        let message = DeliveryMessage {
            version: state.version,
            emitted_at: Some(prost_types::Timestamp::from(std::time::SystemTime::now())),
            payload: Some(payload),
        };
        state.slot = Some(message.clone());
        state.last_activity = Instant::now();

        if let Some(push) = &state.push {
            match push.tx.try_send(message.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        session_id = %session_id,
                        version = state.version,
                        "Push queue full, detaching channel"
                    );
                    state.push = None;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(session_id = %session_id, "Push channel gone, detaching");
                    state.push = None;
                }
            }
        }
        message
    }

    /// Latest artifact for a session, if any. Side-effect free.
    pub async fn read_latest(&self, session_id: &str) -> Option<DeliveryMessage> {
        let session = self.get(session_id).await?;
        let state = session.state.lock().await;
        state.slot.clone()
    }

    /// Current poll version for a session; 0 when nothing was ever written.
    pub async fn latest_version(&self, session_id: &str) -> u64 {
        match self.get(session_id).await {
            Some(session) => session.state.lock().await.version,
            None => 0,
        }
    }

    /// Claim the session's single job slot. Returns `false` when a job is
    /// already processing for this session.
    #[allow(clippy::significant_drop_tightening)]
    pub async fn begin_job(&self, session_id: &str) -> bool {
        let session = self.get_or_create(session_id).await;
        let mut state = session.state.lock().await;
        if state.job_in_flight {
            return false;
        }
        state.job_in_flight = true;
        state.last_activity = Instant::now();
        true
    }

    /// Release the session's job slot. Must run on every job exit path.
    pub async fn end_job(&self, session_id: &str) {
        if let Some(session) = self.get(session_id).await {
            session.state.lock().await.job_in_flight = false;
        }
    }

    /// Whether a push channel is currently attached.
    pub async fn is_attached(&self, session_id: &str) -> bool {
        match self.get(session_id).await {
            Some(session) => session.state.lock().await.push.is_some(),
            None => false,
        }
    }

    /// Count of known sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict sessions with no channel, no running job, and no activity for
    /// longer than `idle_ttl`. Returns the number removed.
    pub async fn sweep_idle(&self, idle_ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.state.try_lock() {
            Ok(state) => {
                state.push.is_some()
                    || state.job_in_flight
                    || state.last_activity.elapsed() < idle_ttl
            }
            // Locked mid-operation: clearly active.
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, "Evicted idle sessions");
        }
        removed
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
