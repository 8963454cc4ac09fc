//! gRPC server implementations for the Wardrobe relay.

pub mod display_svc;
pub mod health;
pub mod intake_svc;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod display_svc_tests;

pub use display_svc::DisplayServiceImpl;
pub use health::RelayHealthService;
pub use intake_svc::IntakeServiceImpl;
