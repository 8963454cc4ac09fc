#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the relay delivery pipeline.
//!
//! Exercises the full flow intake → registry → push channel / poll slot
//! with in-process fakes for the transformation backend; no network.

use std::sync::Arc;

use tokio::sync::{Notify, mpsc};

use wardrobe_proto::v1::delivery_message::Payload;
use wardrobe_relay::intake::{IntakeError, JobIntake, SubmitOutcome};
use wardrobe_relay::registry::{PUSH_CHANNEL_CAPACITY, SessionRegistry};
use wardrobe_relay::transform::{TransformError, Transformer};

/// Deterministic fake backend: result is the prompt followed by the image.
struct EchoTransformer;

#[tonic::async_trait]
impl Transformer for EchoTransformer {
    async fn transform(&self, image: &[u8], prompt: &str) -> Result<Vec<u8>, TransformError> {
        let mut out = prompt.as_bytes().to_vec();
        out.extend_from_slice(image);
        Ok(out)
    }
}

/// Fake backend that parks until released.
struct GatedTransformer {
    gate: Arc<Notify>,
}

#[tonic::async_trait]
impl Transformer for GatedTransformer {
    async fn transform(&self, image: &[u8], _prompt: &str) -> Result<Vec<u8>, TransformError> {
        self.gate.notified().await;
        Ok(image.to_vec())
    }
}

fn components(transformer: Arc<dyn Transformer>) -> (Arc<SessionRegistry>, JobIntake) {
    let registry = Arc::new(SessionRegistry::new());
    let intake = JobIntake::new(Arc::clone(&registry), transformer);
    (registry, intake)
}

// =========================================================================
// Scenario 1: poll-only session observes processing then result
// =========================================================================

#[tokio::test]
async fn poll_only_session_sees_processing_then_result() {
    let gate = Arc::new(Notify::new());
    let (registry, intake) = components(Arc::new(GatedTransformer {
        gate: Arc::clone(&gate),
    }));

    // No push channel attached anywhere.
    let outcome = intake
        .submit("abc", b"img".to_vec(), "1920s".into(), false)
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Accepted));

    // Immediately after the ack: the processing message bumped the version.
    assert_eq!(registry.latest_version("abc").await, 1);
    let message = registry.read_latest("abc").await.unwrap();
    assert!(matches!(message.payload, Some(Payload::Processing(_))));

    // Collaborator completes: a second bump carries the result.
    gate.notify_one();
    loop {
        if registry.latest_version("abc").await == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    let message = registry.read_latest("abc").await.unwrap();
    assert!(matches!(message.payload, Some(Payload::Result(_))));
}

// =========================================================================
// Scenario 2: push channel drops mid-job, poll slot still gets the result
// =========================================================================

#[tokio::test]
async fn result_survives_push_channel_drop_mid_job() {
    let gate = Arc::new(Notify::new());
    let (registry, intake) = components(Arc::new(GatedTransformer {
        gate: Arc::clone(&gate),
    }));

    let (tx, mut rx) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
    let epoch = registry.attach_push("abc", tx).await;

    intake
        .submit("abc", b"img".to_vec(), "victorian".into(), false)
        .await
        .unwrap();

    // The display got the processing status while connected...
    let first = rx.recv().await.unwrap();
    assert!(matches!(first.payload, Some(Payload::Processing(_))));

    // ...then the network drops before the job finishes.
    drop(rx);
    registry.detach_push("abc", epoch).await;

    gate.notify_one();
    loop {
        if registry.latest_version("abc").await == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }

    // Degraded display finds the result on its next poll.
    let message = registry.read_latest("abc").await.unwrap();
    assert_eq!(message.version, 2);
    assert!(matches!(message.payload, Some(Payload::Result(_))));
}

// =========================================================================
// Scenario 3: sessions do not leak into each other
// =========================================================================

#[tokio::test]
async fn submission_leaves_other_sessions_untouched() {
    let (registry, intake) = components(Arc::new(EchoTransformer));

    let (tx1, mut rx1) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
    let (tx2, mut rx2) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
    registry.attach_push("s1", tx1).await;
    registry.attach_push("s2", tx2).await;

    intake
        .submit("s1", b"img".to_vec(), "1920s".into(), true)
        .await
        .unwrap();

    // s1 saw both messages.
    assert!(rx1.recv().await.is_some());
    assert!(rx1.recv().await.is_some());
    assert_eq!(registry.latest_version("s1").await, 2);

    // s2 saw nothing and its version never moved.
    assert_eq!(registry.latest_version("s2").await, 0);
    assert!(rx2.try_recv().is_err());
    assert!(registry.read_latest("s2").await.is_none());
}

// =========================================================================
// Scenario 4: invalid submissions change nothing
// =========================================================================

#[tokio::test]
async fn empty_prompt_rejected_before_any_emission() {
    let (registry, intake) = components(Arc::new(EchoTransformer));

    let (tx, mut rx) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
    registry.attach_push("abc", tx).await;

    let err = intake
        .submit("abc", b"img".to_vec(), String::new(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)));

    assert_eq!(registry.latest_version("abc").await, 0);
    assert!(rx.try_recv().is_err());
}

// =========================================================================
// Round-trip property: poll reflects every write regardless of push
// =========================================================================

#[tokio::test]
async fn missed_push_is_recoverable_by_polling() {
    let (registry, intake) = components(Arc::new(EchoTransformer));

    // Channel with room for a single message: the result delivery finds the
    // queue full (nobody is draining it), which detaches the channel.
    let (tx, _rx) = mpsc::channel(1);
    registry.attach_push("abc", tx).await;

    intake
        .submit("abc", b"img".to_vec(), "1920s".into(), true)
        .await
        .unwrap();

    assert!(!registry.is_attached("abc").await);

    // Both writes are still observable through the poll path.
    assert_eq!(registry.latest_version("abc").await, 2);
    let message = registry.read_latest("abc").await.unwrap();
    assert!(matches!(message.payload, Some(Payload::Result(_))));
}

// =========================================================================
// Busy policy: one job per session, rejections emit nothing
// =========================================================================

#[tokio::test]
async fn concurrent_submission_to_busy_session_is_rejected() {
    let gate = Arc::new(Notify::new());
    let (registry, intake) = components(Arc::new(GatedTransformer {
        gate: Arc::clone(&gate),
    }));

    intake
        .submit("abc", b"one".to_vec(), "1920s".into(), false)
        .await
        .unwrap();

    let err = intake
        .submit("abc", b"two".to_vec(), "1960s".into(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::SessionBusy(_)));
    assert_eq!(registry.latest_version("abc").await, 1);

    // After the first job completes the session accepts work again.
    gate.notify_one();
    loop {
        if registry.latest_version("abc").await == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    gate.notify_one();
    let outcome = intake
        .submit("abc", b"three".to_vec(), "1980s".into(), false)
        .await;
    assert!(outcome.is_ok());
}
