//! Default session id persistence.
//!
//! A stall phone usually targets one fixed display. When no `--session` is
//! given we generate an id once and keep reusing it, so repeated submits
//! land on the same kiosk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use wardrobe_core::validate_session_id;

/// Default path of the persisted session id file.
pub fn default_store_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("wardrobe").join("session_id"))
}

/// Load the persisted session id, or generate and persist a new one.
pub fn load_or_generate(path: &Path) -> anyhow::Result<String> {
    if let Ok(contents) = fs::read_to_string(path) {
        let id = contents.trim().to_string();
        if validate_session_id(&id).is_ok() {
            return Ok(id);
        }
        // Corrupt or hand-edited file: fall through and regenerate.
    }

    let id = uuid::Uuid::new_v4().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, &id).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generates_once_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_id");

        let first = load_or_generate(&path).unwrap();
        let second = load_or_generate(&path).unwrap();

        assert_eq!(first, second);
        validate_session_id(&first).unwrap();
    }

    #[test]
    fn regenerates_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_id");
        fs::write(&path, "not a valid id!!\n").unwrap();

        let id = load_or_generate(&path).unwrap();
        validate_session_id(&id).unwrap();
    }
}
