//! Wardrobe Protocol Buffers
//!
//! Generated protobuf code for the Wardrobe gRPC API.
//!
//! This crate contains:
//! - `IntakeService` for photo submission from input devices
//! - `DisplayService` for push-channel and poll delivery to displays
//! - `Health` for app-level health checking

#![allow(clippy::derive_partial_eq_without_eq)]

/// Wardrobe v1 API definitions.
///
/// All generated types and services are included here.
pub mod v1 {
    tonic::include_proto!("wardrobe.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;

// Re-export prost_types for downstream crates that need Timestamp conversion
pub use prost_types;
