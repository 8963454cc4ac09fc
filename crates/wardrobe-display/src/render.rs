//! Display-local render state.
//!
//! Both delivery paths (push loop and poll loop) write into one shared
//! `RenderState`. Updates are applied atomically per message and keyed by
//! version, so a superseded poll response racing a fresher push can never
//! tear the surface into a half-state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use wardrobe_proto::v1::{DeliveryMessage, delivery_message::Payload};

/// What the kiosk surface is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scene {
    /// Nothing received yet: "waiting for the next transformation".
    #[default]
    Waiting,
    /// A job is running; show the original photo and the prompt.
    Processing {
        prompt: String,
        original_preview: Vec<u8>,
    },
    /// The job failed; prior images are cleared.
    Failed { detail: String },
    /// A finished transformation.
    Showing { prompt: String, image: Vec<u8> },
}

/// Versioned render state with last-write-wins semantics.
#[derive(Debug, Default)]
pub struct RenderState {
    scene: Scene,
    last_version: u64,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a delivery message. Returns `false` (and changes nothing) for
    /// messages at or below the last observed version.
    pub fn apply(&mut self, message: &DeliveryMessage) -> bool {
        if message.version <= self.last_version {
            debug!(
                version = message.version,
                last_version = self.last_version,
                "Stale message dropped"
            );
            return false;
        }
        self.last_version = message.version;
        self.scene = match &message.payload {
            Some(Payload::Processing(p)) => Scene::Processing {
                prompt: p.prompt.clone(),
                original_preview: p.original_preview.clone(),
            },
            Some(Payload::Failure(f)) => Scene::Failed {
                detail: f.detail.clone(),
            },
            Some(Payload::Result(r)) => Scene::Showing {
                prompt: r.prompt.clone(),
                image: r.image.clone(),
            },
            None => {
                warn!(version = message.version, "Message without payload");
                Scene::Waiting
            }
        };
        true
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Highest version applied so far; the poll loop fetches only above it.
    pub fn last_version(&self) -> u64 {
        self.last_version
    }
}

/// Writes scene images into the directory the kiosk surface watches.
///
/// `latest.png` is the transformed result, `original.png` the pre-transform
/// preview. Writes go through a temp file plus rename so the kiosk never
/// reads a torn image.
#[derive(Debug, Clone)]
pub struct ResultSink {
    dir: PathBuf,
}

impl ResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reflect the scene onto disk. A failure clears both images, matching
    /// the protocol contract that `status/error` resets the display.
    pub fn apply(&self, scene: &Scene) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        match scene {
            Scene::Waiting => {}
            Scene::Processing {
                original_preview, ..
            } => {
                write_atomic(&self.dir.join("original.png"), original_preview)?;
            }
            Scene::Failed { detail } => {
                info!(detail = %detail, "Clearing display images after failure");
                remove_if_present(&self.dir.join("latest.png"))?;
                remove_if_present(&self.dir.join("original.png"))?;
            }
            Scene::Showing { image, prompt } => {
                write_atomic(&self.dir.join("latest.png"), image)?;
                info!(prompt = %prompt, bytes = image.len(), "Result image written");
            }
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("png.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
