//! Job submission intake.
//!
//! Accepts a transformation request targeted at one session, emits the
//! `processing` status immediately, runs the transformation collaborator,
//! and fans the outcome into the session's delivery state. Only registry
//! mutations are serialized per session; the transformation itself runs
//! outside every lock so a slow job cannot stall other sessions.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use wardrobe_core::validate_session_id;
use wardrobe_proto::v1::{DeliveryMessage, JobFailure, JobResult, Processing};
use wardrobe_proto::v1::delivery_message::Payload;

use crate::registry::SessionRegistry;
use crate::transform::Transformer;

/// Outcome of a submission, from the input device's point of view.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Job accepted; delivery happens toward the display (fire-and-forget).
    Accepted,
    /// Single-device mode: the terminal message for the job.
    Completed(DeliveryMessage),
}

/// Submission errors. Both variants reject the request before any
/// delivery state changes; nothing is emitted toward the display.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session busy: {0}")]
    SessionBusy(String),
}

/// Accepts jobs from input devices and fans results out to displays.
pub struct JobIntake {
    registry: Arc<SessionRegistry>,
    transformer: Arc<dyn Transformer>,
}

impl JobIntake {
    pub fn new(registry: Arc<SessionRegistry>, transformer: Arc<dyn Transformer>) -> Self {
        Self {
            registry,
            transformer,
        }
    }

    /// Submit a transformation job for `session_id`.
    ///
    /// With `wait` unset the call returns as soon as the job is accepted
    /// and the `processing` status is on its way to the display. With
    /// `wait` set the call blocks until the job finishes and returns the
    /// terminal message in the ack (single-device mode).
    ///
    /// At most one job may be processing per session; a submission for a
    /// busy session is rejected without emitting anything.
    #[instrument(skip(self, image), fields(image_len = image.len()))]
    pub async fn submit(
        &self,
        session_id: &str,
        image: Vec<u8>,
        prompt: String,
        wait: bool,
    ) -> Result<SubmitOutcome, IntakeError> {
        validate_session_id(session_id).map_err(|e| IntakeError::Validation(e.to_string()))?;
        if image.is_empty() {
            return Err(IntakeError::Validation("image is empty".into()));
        }
        if prompt.trim().is_empty() {
            return Err(IntakeError::Validation("prompt is empty".into()));
        }

        if !self.registry.begin_job(session_id).await {
            return Err(IntakeError::SessionBusy(session_id.to_string()));
        }

        info!(session_id = %session_id, prompt = %prompt, "Job accepted");

        // Show progress on the display within one round trip: the preview
        // is the original image, echoed so the kiosk is never blank.
        self.registry
            .write_result(
                session_id,
                Payload::Processing(Processing {
                    prompt: prompt.clone(),
                    original_preview: image.clone(),
                }),
            )
            .await;

        if wait {
            let message = run_job(
                Arc::clone(&self.registry),
                Arc::clone(&self.transformer),
                session_id.to_string(),
                image,
                prompt,
            )
            .await;
            return Ok(SubmitOutcome::Completed(message));
        }

        let registry = Arc::clone(&self.registry);
        let transformer = Arc::clone(&self.transformer);
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            run_job(registry, transformer, session_id, image, prompt).await;
        });
        Ok(SubmitOutcome::Accepted)
    }

    /// The registry this intake fans out into.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

/// Run one transformation and deliver its terminal message. The job slot
/// is released on every exit path; a failed job never poisons the session.
async fn run_job(
    registry: Arc<SessionRegistry>,
    transformer: Arc<dyn Transformer>,
    session_id: String,
    image: Vec<u8>,
    prompt: String,
) -> DeliveryMessage {
    let payload = match transformer.transform(&image, &prompt).await {
        Ok(result_image) => {
            info!(
                session_id = %session_id,
                result_len = result_image.len(),
                "Transformation finished"
            );
            Payload::Result(JobResult {
                image: result_image,
                prompt,
            })
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Transformation failed");
            Payload::Failure(JobFailure {
                detail: e.to_string(),
            })
        }
    };

    let message = registry.write_result(&session_id, payload).await;
    registry.end_job(&session_id).await;
    message
}
