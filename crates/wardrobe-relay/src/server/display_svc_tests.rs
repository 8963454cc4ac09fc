//! Tests for the `DisplayService` poll and download endpoints.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use tonic::{Code, Request};

use wardrobe_proto::v1::display_service_server::DisplayService;
use wardrobe_proto::v1::{
    DownloadLatestRequest, FetchLatestRequest, JobResult, PollStatusRequest, Processing,
    delivery_message::Payload,
};

use crate::registry::SessionRegistry;
use crate::server::display_svc::DisplayServiceImpl;

fn setup() -> (Arc<SessionRegistry>, DisplayServiceImpl) {
    let registry = Arc::new(SessionRegistry::new());
    let svc = DisplayServiceImpl::new(Arc::clone(&registry));
    (registry, svc)
}

fn poll(session_id: &str) -> Request<PollStatusRequest> {
    Request::new(PollStatusRequest {
        session_id: session_id.into(),
    })
}

#[tokio::test]
async fn poll_status_reports_zero_for_fresh_session() {
    let (_registry, svc) = setup();

    let resp = svc.poll_status(poll("abc")).await.unwrap().into_inner();
    assert_eq!(resp.version, 0);
}

#[tokio::test]
async fn poll_status_tracks_writes() {
    let (registry, svc) = setup();

    registry
        .write_result(
            "abc",
            Payload::Processing(Processing {
                prompt: "1920s".into(),
                original_preview: b"img".to_vec(),
            }),
        )
        .await;

    let resp = svc.poll_status(poll("abc")).await.unwrap().into_inner();
    assert_eq!(resp.version, 1);

    // Repeated polls with no writes are stable.
    let resp = svc.poll_status(poll("abc")).await.unwrap().into_inner();
    assert_eq!(resp.version, 1);
}

#[tokio::test]
async fn poll_status_rejects_bad_session_id() {
    let (_registry, svc) = setup();

    let err = svc.poll_status(poll("not valid!")).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn fetch_latest_returns_not_found_when_empty() {
    let (_registry, svc) = setup();

    let err = svc
        .fetch_latest(Request::new(FetchLatestRequest {
            session_id: "abc".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn fetch_latest_returns_current_message() {
    let (registry, svc) = setup();

    registry
        .write_result(
            "abc",
            Payload::Result(JobResult {
                image: b"out".to_vec(),
                prompt: "1920s".into(),
            }),
        )
        .await;

    let resp = svc
        .fetch_latest(Request::new(FetchLatestRequest {
            session_id: "abc".into(),
        }))
        .await
        .unwrap()
        .into_inner();

    let message = resp.message.unwrap();
    assert_eq!(message.version, 1);
    assert!(matches!(message.payload, Some(Payload::Result(_))));
}

#[tokio::test]
async fn download_latest_returns_result_image() {
    let (registry, svc) = setup();

    registry
        .write_result(
            "abc",
            Payload::Result(JobResult {
                image: b"out".to_vec(),
                prompt: "1920s".into(),
            }),
        )
        .await;

    let resp = svc
        .download_latest(Request::new(DownloadLatestRequest {
            session_id: "abc".into(),
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.image, b"out");
    assert_eq!(resp.prompt, "1920s");
}

#[tokio::test]
async fn download_latest_rejects_non_result_artifact() {
    let (registry, svc) = setup();

    registry
        .write_result(
            "abc",
            Payload::Processing(Processing {
                prompt: "1920s".into(),
                original_preview: b"img".to_vec(),
            }),
        )
        .await;

    let err = svc
        .download_latest(Request::new(DownloadLatestRequest {
            session_id: "abc".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}
