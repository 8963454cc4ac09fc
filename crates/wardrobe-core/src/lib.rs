//! Wardrobe Core Library
//!
//! Shared functionality for the Wardrobe relay, display, and CLI:
//! - Error types
//! - Session identifier validation
//! - Tracing/logging initialisation

pub mod error;
pub mod session;
pub mod tracing_init;

pub use error::{Error, Result};
pub use session::validate_session_id;
