//! Relay connection client.
//!
//! Manages the gRPC connection from the input device to the relay.

use std::path::PathBuf;
use std::time::Duration;

use tonic::transport::{Certificate, Channel, ClientTlsConfig};

use wardrobe_proto::v1::display_service_client::DisplayServiceClient;
use wardrobe_proto::v1::intake_service_client::IntakeServiceClient;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Relay address.
    pub addr: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout. Submissions in wait mode block for the whole
    /// transformation, so this is generous.
    pub request_timeout: Duration,
    /// Path to CA certificate for verifying the relay's TLS certificate.
    pub ca_cert_path: Option<PathBuf>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addr: "http://127.0.0.1:50051".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(300),
            ca_cert_path: None,
        }
    }
}

/// Client connection to the relay.
pub struct RelayConnection {
    channel: Channel,
}

impl RelayConnection {
    /// Connect to the relay described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> anyhow::Result<Self> {
        let mut endpoint = Channel::from_shared(config.addr.clone())?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        if config.addr.starts_with("https://") {
            let mut tls_config = ClientTlsConfig::new().with_enabled_roots();
            if let Some(ca_path) = &config.ca_cert_path {
                let ca_pem = std::fs::read_to_string(ca_path)?;
                tls_config = tls_config.ca_certificate(Certificate::from_pem(ca_pem));
            }
            endpoint = endpoint.tls_config(tls_config)?;
        }

        let channel = endpoint.connect().await?;
        Ok(Self { channel })
    }

    /// Intake client for submissions.
    pub fn intake(&self) -> IntakeServiceClient<Channel> {
        IntakeServiceClient::new(self.channel.clone())
    }

    /// Display client for poll/download helpers.
    pub fn display(&self) -> DisplayServiceClient<Channel> {
        DisplayServiceClient::new(self.channel.clone())
    }
}
