//! Transformation collaborator boundary.
//!
//! The relay treats the image transformation as an opaque function: image
//! bytes plus a style prompt in, transformed image bytes or an error out.
//! The model pipeline itself lives behind [`Transformer`] implementations
//! and owns no session state.

mod http;

pub use http::HttpTransformer;

/// Opaque transformation collaborator.
///
/// Implementations are invoked with borrowed input and return an owned
/// output; they must be safe to call concurrently for different sessions.
#[tonic::async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, image: &[u8], prompt: &str) -> Result<Vec<u8>, TransformError>;
}

/// Transformation failures, surfaced to displays as `status/error`.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Transformation backend unreachable: {0}")]
    Backend(String),

    #[error("Transformation rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}
