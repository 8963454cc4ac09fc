//! Error types for the `Wardrobe` core library.

use thiserror::Error;

/// Result type alias using `Wardrobe` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `Wardrobe` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session identifier failed validation
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
