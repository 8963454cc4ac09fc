//! HTTP adapter for the transformation backend.
//!
//! Ships the raw image bytes to the inpainting service and returns the
//! transformed image from the response body. The prompt travels as a query
//! parameter so the body stays binary.

use std::time::Duration;

use tracing::debug;

use super::{TransformError, Transformer};

/// Transformer backed by an HTTP inpainting service.
pub struct HttpTransformer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransformer {
    /// Create an adapter for the backend at `base_url`.
    ///
    /// `timeout` bounds the whole request; inpainting runs tens of seconds
    /// on CPU-only hosts, so callers should be generous.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransformError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransformError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[tonic::async_trait]
impl Transformer for HttpTransformer {
    async fn transform(&self, image: &[u8], prompt: &str) -> Result<Vec<u8>, TransformError> {
        let url = format!("{}/transform", self.base_url.trim_end_matches('/'));
        debug!(url = %url, image_len = image.len(), "Submitting transformation");

        let response = self
            .client
            .post(&url)
            .query(&[("prompt", prompt)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| TransformError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransformError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransformError::Backend(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
