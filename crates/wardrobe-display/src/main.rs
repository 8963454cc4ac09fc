//! Wardrobe Display Client
//!
//! Kiosk-side binary: subscribes to one display session on the relay and
//! keeps the output directory in sync with the latest transformation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use wardrobe_core::tracing_init::init_tracing;
use wardrobe_core::validate_session_id;
use wardrobe_display::client::DisplayClient;
use wardrobe_display::config::DisplayConfig;

#[derive(Parser, Debug)]
#[command(name = "wardrobe-display")]
#[command(version, about = "Wardrobe display client - kiosk result surface")]
struct Args {
    /// Relay server URL.
    #[arg(
        long,
        env = "WARDROBE_RELAY_URL",
        default_value = "http://127.0.0.1:50051"
    )]
    relay_url: String,

    /// Session id this display serves. Input devices target the same id.
    #[arg(long, env = "WARDROBE_SESSION_ID")]
    session: String,

    /// Directory to write rendered images into.
    #[arg(long, default_value = "wardrobe-display-out")]
    output_dir: PathBuf,

    /// Poll interval in seconds (fallback delivery path).
    #[arg(long, default_value_t = 3)]
    poll_interval: u64,

    /// Fixed delay in seconds between reconnect attempts.
    #[arg(long, default_value_t = 3)]
    reconnect_delay: u64,

    /// Path to CA certificate for verifying the relay's TLS certificate.
    #[arg(long)]
    ca_cert: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing("wardrobe_display=info", args.log_json);

    validate_session_id(&args.session)?;

    let mut config = DisplayConfig::new(args.relay_url, args.session, args.output_dir);
    config.poll_interval = Duration::from_secs(args.poll_interval);
    config.reconnect.initial_delay = Duration::from_secs(args.reconnect_delay);
    config.reconnect.max_delay = Duration::from_secs(args.reconnect_delay);
    config.ca_cert_path = args.ca_cert;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        relay_url = %config.relay_url,
        session_id = %config.session_id,
        output_dir = %config.output_dir.display(),
        "Starting wardrobe-display"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        let _ = shutdown_tx.send(true);
    });

    let client = DisplayClient::new(config);
    client.run(shutdown_rx).await;

    info!("Display stopped");
    Ok(())
}
