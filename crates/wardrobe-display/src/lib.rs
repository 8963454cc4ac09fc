//! Wardrobe Display Client Library
//!
//! Runs on the kiosk machine that shows transformation results:
//! - Push subscription over a long-lived channel to the relay
//! - Interval polling fallback with version-based change detection
//! - Reconnection state machine (no terminal state; the display runs
//!   indefinitely)
//! - Atomic render state shared by both delivery paths

pub mod client;
pub mod config;
pub mod error;
pub mod phase;
pub mod poller;
pub mod render;
