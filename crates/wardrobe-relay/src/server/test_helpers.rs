//! Shared test helpers for relay service test modules.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use crate::intake::JobIntake;
use crate::registry::SessionRegistry;
use crate::transform::{TransformError, Transformer};

/// Transformer that prepends the prompt to the image bytes.
pub struct EchoTransformer;

#[tonic::async_trait]
impl Transformer for EchoTransformer {
    async fn transform(&self, image: &[u8], prompt: &str) -> Result<Vec<u8>, TransformError> {
        let mut out = prompt.as_bytes().to_vec();
        out.extend_from_slice(image);
        Ok(out)
    }
}

/// Transformer that always fails.
pub struct FailingTransformer;

#[tonic::async_trait]
impl Transformer for FailingTransformer {
    async fn transform(&self, _image: &[u8], _prompt: &str) -> Result<Vec<u8>, TransformError> {
        Err(TransformError::Backend("model not loaded".into()))
    }
}

/// Registry plus an intake wired to the given transformer.
pub fn setup_intake(transformer: Arc<dyn Transformer>) -> (Arc<SessionRegistry>, Arc<JobIntake>) {
    let registry = Arc::new(SessionRegistry::new());
    let intake = Arc::new(JobIntake::new(Arc::clone(&registry), transformer));
    (registry, intake)
}
