//! `wardrobe submit` - send a photo and era prompt to a display session.

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::info;

use wardrobe_proto::v1::SubmitRequest;
use wardrobe_proto::v1::delivery_message::Payload;

use crate::connection::RelayConnection;

/// Submit a transformation job.
///
/// Fire-and-forget by default: the result goes to the display device. With
/// `wait` (single-device mode) the terminal outcome comes back in the ack;
/// a result image is then printed or saved to `output`.
pub async fn run(
    conn: &RelayConnection,
    session_id: &str,
    image_path: &Path,
    prompt: &str,
    wait: bool,
    output: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    info!(
        session_id = %session_id,
        image = %image_path.display(),
        prompt = %prompt,
        "Submitting transformation"
    );

    let ack = conn
        .intake()
        .submit_transform(SubmitRequest {
            session_id: session_id.to_string(),
            image,
            prompt: prompt.to_string(),
            wait,
        })
        .await
        .context("Submission failed")?
        .into_inner();

    match ack.outcome.and_then(|m| m.payload) {
        None => {
            println!("Submitted. Watch the display for the result.");
        }
        Some(Payload::Result(result)) => match output {
            Some(path) => {
                std::fs::write(path, &result.image)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Result saved to {} ({} bytes)", path.display(), result.image.len());
            }
            None => {
                println!(
                    "Transformation finished ({} bytes). Pass --output to save the image.",
                    result.image.len()
                );
            }
        },
        Some(Payload::Failure(failure)) => {
            bail!("Transformation failed: {}", failure.detail);
        }
        Some(Payload::Processing(_)) => {
            // The relay only acks wait-mode jobs with a terminal message.
            bail!("Relay returned a non-terminal outcome");
        }
    }

    Ok(())
}
