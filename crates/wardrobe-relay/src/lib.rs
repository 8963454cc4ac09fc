//! Wardrobe Relay Server Library
//!
//! Core functionality for the Wardrobe relay:
//! - In-memory session registry with the latest-artifact slot per session
//! - Job submission intake and result fan-out
//! - Transformation collaborator boundary
//! - gRPC services (Intake, Display, Health)

pub mod intake;
pub mod registry;
pub mod server;
pub mod tls;
pub mod transform;
