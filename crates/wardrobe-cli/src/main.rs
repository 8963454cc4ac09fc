//! Wardrobe CLI
//!
//! Input-device command line for the photo stall: submit a captured photo
//! and an era prompt to a display session, or fetch results directly in
//! single-device mode.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wardrobe_cli::connection::{ConnectionConfig, RelayConnection};
use wardrobe_cli::{session_cmd, session_store, submit_cmd};
use wardrobe_core::tracing_init::init_tracing;
use wardrobe_core::validate_session_id;

#[derive(Parser, Debug)]
#[command(name = "wardrobe")]
#[command(version, about = "Wardrobe input-device CLI", long_about = None)]
struct Cli {
    /// Relay server URL.
    #[arg(
        long,
        global = true,
        env = "WARDROBE_RELAY_URL",
        default_value = "http://127.0.0.1:50051"
    )]
    relay_url: String,

    /// Target session id. Generated once and reused when omitted.
    #[arg(long, global = true, env = "WARDROBE_SESSION_ID")]
    session: Option<String>,

    /// Path to CA certificate for verifying the relay's TLS certificate.
    #[arg(long, global = true)]
    ca_cert: Option<PathBuf>,

    /// Output logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a photo and era prompt for transformation.
    Submit {
        /// Image file to transform (JPG, PNG).
        #[arg(long)]
        image: PathBuf,

        /// Era prompt, e.g. "a roaring 20s flapper dress".
        #[arg(long)]
        prompt: String,

        /// Single-device mode: wait for the outcome instead of delivering
        /// to a separate display.
        #[arg(long)]
        wait: bool,

        /// Where to save the result image (wait mode only).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the session's current poll version.
    Status {
        /// Machine-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Download the most recent result image.
    Download {
        /// Where to save the image.
        #[arg(long, default_value = "wardrobe-result.png")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing("wardrobe_cli=warn", cli.log_json);

    let session_id = match &cli.session {
        Some(id) => {
            validate_session_id(id)?;
            id.clone()
        }
        None => {
            let path = session_store::default_store_path()?;
            session_store::load_or_generate(&path)?
        }
    };

    let config = ConnectionConfig {
        addr: cli.relay_url.clone(),
        ca_cert_path: cli.ca_cert.clone(),
        ..Default::default()
    };
    let conn = RelayConnection::connect(&config).await?;

    match &cli.command {
        Command::Submit {
            image,
            prompt,
            wait,
            output,
        } => submit_cmd::run(&conn, &session_id, image, prompt, *wait, output.as_ref()).await,
        Command::Status { json } => session_cmd::status(&conn, &session_id, *json).await,
        Command::Download { output } => session_cmd::download(&conn, &session_id, output).await,
    }
}
