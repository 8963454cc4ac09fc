//! Display client error types.

/// Errors that can occur in the display client.
#[derive(Debug, thiserror::Error)]
pub enum DisplayClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Subscribe error: {0}")]
    Subscribe(String),

    #[error("Stream error: {0}")]
    Stream(String),
}
