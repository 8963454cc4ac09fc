//! DisplayService gRPC implementation: push channel and poll endpoints.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info, instrument};

use wardrobe_core::validate_session_id;
use wardrobe_proto::v1::display_service_server::DisplayService;
use wardrobe_proto::v1::{
    DeliveryMessage, DisplayFrame, DownloadLatestRequest, DownloadLatestResponse,
    FetchLatestRequest, FetchLatestResponse, PollStatusRequest, PollStatusResponse, display_frame,
    delivery_message::Payload,
};

use crate::registry::{PUSH_CHANNEL_CAPACITY, SessionRegistry};

type PushStream = Pin<Box<dyn tokio_stream::Stream<Item = Result<DeliveryMessage, Status>> + Send>>;

pub struct DisplayServiceImpl {
    registry: Arc<SessionRegistry>,
}

impl DisplayServiceImpl {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[allow(clippy::result_large_err)]
fn checked_session_id(session_id: &str) -> Result<&str, Status> {
    validate_session_id(session_id).map_err(|e| Status::invalid_argument(e.to_string()))?;
    Ok(session_id)
}

#[tonic::async_trait]
impl DisplayService for DisplayServiceImpl {
    type OpenPushChannelStream = PushStream;

    #[instrument(skip(self, request), fields(rpc = "OpenPushChannel"))]
    async fn open_push_channel(
        &self,
        request: Request<Streaming<DisplayFrame>>,
    ) -> Result<Response<Self::OpenPushChannelStream>, Status> {
        let mut in_stream = request.into_inner();

        // Channel the registry pushes delivery messages into
        let (msg_tx, msg_rx) = mpsc::channel::<DeliveryMessage>(PUSH_CHANNEL_CAPACITY);
        // Channel for the output stream back to the display
        let (out_tx, out_rx) = mpsc::channel::<Result<DeliveryMessage, Status>>(PUSH_CHANNEL_CAPACITY);

        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            // First frame must identify the session
            let session_id = match in_stream.next().await {
                Some(Ok(frame)) => match frame.frame {
                    Some(display_frame::Frame::Hello(hello)) => hello.session_id,
                    _ => String::new(),
                },
                _ => String::new(),
            };

            if validate_session_id(&session_id).is_err() {
                let _ = out_tx
                    .send(Err(Status::invalid_argument(
                        "First frame must be a Hello with a valid session id",
                    )))
                    .await;
                return;
            }

            info!(session_id = %session_id, "Push channel opened");
            let epoch = registry.attach_push(&session_id, msg_tx).await;

            // Forward delivery messages to the display
            let out_tx_fwd = out_tx.clone();
            let forward_handle = tokio::spawn(async move {
                let mut msg_rx = msg_rx;
                while let Some(message) = msg_rx.recv().await {
                    if out_tx_fwd.send(Ok(message)).await.is_err() {
                        break;
                    }
                }
            });

            // Drain client frames until the transport closes. Displays only
            // send keepalive pings after the Hello.
            while let Some(result) = in_stream.next().await {
                match result {
                    Ok(frame) => match frame.frame {
                        Some(display_frame::Frame::Ping(_)) => {
                            debug!(session_id = %session_id, "Ping");
                        }
                        Some(display_frame::Frame::Hello(_)) => {
                            debug!(session_id = %session_id, "Duplicate Hello ignored");
                        }
                        None => {}
                    },
                    Err(e) => {
                        // Network drops land here; not user-visible as an
                        // error, the display's reconnect loop handles it.
                        error!(session_id = %session_id, error = %e, "Push channel stream error");
                        break;
                    }
                }
            }

            info!(session_id = %session_id, "Push channel closed");
            registry.detach_push(&session_id, epoch).await;
            forward_handle.abort();
        });

        let out_stream = ReceiverStream::new(out_rx);
        Ok(Response::new(Box::pin(out_stream)))
    }

    #[instrument(skip(self, request), fields(rpc = "PollStatus"))]
    async fn poll_status(
        &self,
        request: Request<PollStatusRequest>,
    ) -> Result<Response<PollStatusResponse>, Status> {
        let req = request.into_inner();
        let session_id = checked_session_id(&req.session_id)?;
        let version = self.registry.latest_version(session_id).await;
        Ok(Response::new(PollStatusResponse { version }))
    }

    #[instrument(skip(self, request), fields(rpc = "FetchLatest"))]
    async fn fetch_latest(
        &self,
        request: Request<FetchLatestRequest>,
    ) -> Result<Response<FetchLatestResponse>, Status> {
        let req = request.into_inner();
        let session_id = checked_session_id(&req.session_id)?;

        match self.registry.read_latest(session_id).await {
            Some(message) => Ok(Response::new(FetchLatestResponse {
                message: Some(message),
            })),
            None => Err(Status::not_found("No artifact for session")),
        }
    }

    #[instrument(skip(self, request), fields(rpc = "DownloadLatest"))]
    async fn download_latest(
        &self,
        request: Request<DownloadLatestRequest>,
    ) -> Result<Response<DownloadLatestResponse>, Status> {
        let req = request.into_inner();
        let session_id = checked_session_id(&req.session_id)?;

        match self.registry.read_latest(session_id).await {
            Some(DeliveryMessage {
                payload: Some(Payload::Result(result)),
                ..
            }) => Ok(Response::new(DownloadLatestResponse {
                image: result.image,
                prompt: result.prompt,
            })),
            Some(_) => Err(Status::not_found("Latest message is not a result")),
            None => Err(Status::not_found("No artifact for session")),
        }
    }
}
