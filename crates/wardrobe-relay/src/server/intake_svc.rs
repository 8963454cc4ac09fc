//! IntakeService gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::instrument;

use wardrobe_proto::v1::intake_service_server::IntakeService;
use wardrobe_proto::v1::{SubmitAck, SubmitRequest};

use crate::intake::{IntakeError, JobIntake, SubmitOutcome};

pub struct IntakeServiceImpl {
    intake: Arc<JobIntake>,
}

impl IntakeServiceImpl {
    pub fn new(intake: Arc<JobIntake>) -> Self {
        Self { intake }
    }
}

#[tonic::async_trait]
impl IntakeService for IntakeServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "SubmitTransform"))]
    async fn submit_transform(
        &self,
        request: Request<SubmitRequest>,
    ) -> Result<Response<SubmitAck>, Status> {
        let req = request.into_inner();

        match self
            .intake
            .submit(&req.session_id, req.image, req.prompt, req.wait)
            .await
        {
            Ok(SubmitOutcome::Accepted) => Ok(Response::new(SubmitAck {
                accepted: true,
                outcome: None,
            })),
            Ok(SubmitOutcome::Completed(message)) => Ok(Response::new(SubmitAck {
                accepted: true,
                outcome: Some(message),
            })),
            Err(IntakeError::Validation(detail)) => Err(Status::invalid_argument(detail)),
            Err(IntakeError::SessionBusy(session_id)) => Err(Status::resource_exhausted(format!(
                "Session busy: {session_id}"
            ))),
        }
    }
}
