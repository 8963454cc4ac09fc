//! `wardrobe status` and `wardrobe download` - poll-side helpers.

#![allow(clippy::print_stdout)]

use std::path::Path;

use anyhow::Context;

use wardrobe_proto::v1::{DownloadLatestRequest, PollStatusRequest};

use crate::connection::RelayConnection;

/// Print the current poll version for a session.
pub async fn status(conn: &RelayConnection, session_id: &str, json: bool) -> anyhow::Result<()> {
    let version = conn
        .display()
        .poll_status(PollStatusRequest {
            session_id: session_id.to_string(),
        })
        .await
        .context("Status poll failed")?
        .into_inner()
        .version;

    if json {
        println!(
            "{}",
            serde_json::json!({ "session_id": session_id, "version": version })
        );
    } else if version == 0 {
        println!("Session {session_id}: no artifact yet");
    } else {
        println!("Session {session_id}: version {version}");
    }
    Ok(())
}

/// Download the most recent result image for a session.
pub async fn download(
    conn: &RelayConnection,
    session_id: &str,
    output: &Path,
) -> anyhow::Result<()> {
    let response = conn
        .display()
        .download_latest(DownloadLatestRequest {
            session_id: session_id.to_string(),
        })
        .await
        .context("Download failed")?
        .into_inner();

    std::fs::write(output, &response.image)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Saved \"{}\" result to {} ({} bytes)",
        response.prompt,
        output.display(),
        response.image.len()
    );
    Ok(())
}
