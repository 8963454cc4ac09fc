//! Wardrobe CLI
//!
//! Input-device command line: capture-side submission of photos and
//! prompts, plus poll/download helpers for single-device use.

pub mod connection;
pub mod session_cmd;
pub mod session_store;
pub mod submit_cmd;
