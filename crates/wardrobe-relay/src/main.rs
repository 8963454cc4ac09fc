//! Wardrobe Relay Server
//!
//! Routes transformation jobs from input devices to display sessions,
//! delivering status and results over push channels or poll reads.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;
use tracing::{info, warn};

use wardrobe_proto::v1::display_service_server::DisplayServiceServer;
use wardrobe_proto::v1::health_server::HealthServer;
use wardrobe_proto::v1::intake_service_server::IntakeServiceServer;

use wardrobe_core::tracing_init::init_tracing;
use wardrobe_relay::intake::JobIntake;
use wardrobe_relay::registry::SessionRegistry;
use wardrobe_relay::server::{DisplayServiceImpl, IntakeServiceImpl, RelayHealthService};
use wardrobe_relay::tls::TlsMode;
use wardrobe_relay::transform::HttpTransformer;

#[derive(Parser, Debug)]
#[command(name = "wardrobe-relay")]
#[command(
    version,
    about = "Wardrobe relay server - display session routing for the photo stall"
)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:50051")]
    addr: SocketAddr,

    /// Base URL of the transformation backend.
    #[arg(
        long,
        env = "WARDROBE_TRANSFORM_URL",
        default_value = "http://127.0.0.1:8000"
    )]
    transform_url: String,

    /// Transformation request timeout in seconds. Inpainting is slow on
    /// CPU-only hosts, so the default is generous.
    #[arg(long, default_value_t = 180)]
    transform_timeout: u64,

    /// Seconds of inactivity before an unused session is evicted.
    #[arg(long, default_value_t = 3600)]
    session_idle_ttl: u64,

    /// Enable dev TLS with auto-generated self-signed certificates.
    #[arg(long)]
    dev_tls: bool,

    /// Path to TLS certificate file (PEM). Mutually exclusive with --dev-tls.
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM). Mutually exclusive with --dev-tls.
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing("wardrobe_relay=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        transform_url = %args.transform_url,
        "Starting wardrobe-relay"
    );

    let registry = Arc::new(SessionRegistry::new());
    let transformer = Arc::new(HttpTransformer::new(
        args.transform_url.clone(),
        Duration::from_secs(args.transform_timeout),
    )?);
    let intake = Arc::new(JobIntake::new(Arc::clone(&registry), transformer));

    // Build services
    let intake_svc = IntakeServiceImpl::new(intake);
    let display_svc = DisplayServiceImpl::new(Arc::clone(&registry));
    let health_svc = RelayHealthService::new();

    let (health_reporter, grpc_health_svc) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<IntakeServiceServer<IntakeServiceImpl>>()
        .await;
    health_reporter
        .set_serving::<DisplayServiceServer<DisplayServiceImpl>>()
        .await;

    // Determine TLS mode
    let tls_mode = if args.dev_tls {
        let cert_dir = dirs_cert_dir()?;
        TlsMode::DevSelfSigned { cert_dir }
    } else if let (Some(cert), Some(key)) = (&args.tls_cert, &args.tls_key) {
        TlsMode::Custom {
            cert_path: cert.clone(),
            key_path: key.clone(),
        }
    } else {
        TlsMode::Disabled
    };

    let tls_config = tls_mode.to_server_tls_config()?;

    let mut builder = Server::builder()
        .http2_keepalive_interval(Some(Duration::from_secs(30)))
        .http2_keepalive_timeout(Some(Duration::from_secs(10)));
    if let Some(tls) = tls_config {
        builder = builder.tls_config(tls)?;
        info!(addr = %args.addr, "Relay server starting with TLS");
    } else {
        info!(addr = %args.addr, "Relay server starting (plaintext)");
    }

    // Spawn background task to evict idle sessions
    let sweep_registry = Arc::clone(&registry);
    let idle_ttl = Duration::from_secs(args.session_idle_ttl);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            let removed = sweep_registry.sweep_idle(idle_ttl).await;
            if removed > 0 {
                info!(removed, "Background session sweep completed");
            }
        }
    });

    let grpc_router = builder
        .add_service(grpc_health_svc)
        .add_service(HealthServer::new(health_svc))
        .add_service(IntakeServiceServer::new(intake_svc))
        .add_service(DisplayServiceServer::new(display_svc));

    tokio::select! {
        result = grpc_router.serve(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Relay stopped");
    Ok(())
}

/// Directory for auto-generated dev certificates.
fn dirs_cert_dir() -> anyhow::Result<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        warn!("Cannot determine home directory, using ./certs");
        return Ok(PathBuf::from("certs"));
    };
    Ok(home.join(".wardrobe").join("certs"))
}
