//! Session identifier validation.
//!
//! Session ids are opaque and caller-generated: a display chooses one when
//! it first connects and the input device targets the same id on submit.
//! The relay only requires that ids are non-empty, bounded, and URL-safe so
//! they can travel in QR codes and query strings unescaped.

use crate::error::Error;

/// Maximum accepted session id length.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Validate a caller-supplied session id.
///
/// Accepts ASCII alphanumerics plus `-`, `_` and `.`, between 1 and
/// [`MAX_SESSION_ID_LEN`] bytes.
pub fn validate_session_id(id: &str) -> Result<(), Error> {
    if id.is_empty() {
        return Err(Error::InvalidSessionId("empty".into()));
    }
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(Error::InvalidSessionId(format!(
            "longer than {MAX_SESSION_ID_LEN} bytes"
        )));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidSessionId(format!(
            "character {bad:?} is not URL-safe"
        )));
    }
    Ok(())
}
