//! Session registry: per-session delivery state and the latest-artifact slot.

mod session;

pub use session::{PUSH_CHANNEL_CAPACITY, SessionRegistry};
