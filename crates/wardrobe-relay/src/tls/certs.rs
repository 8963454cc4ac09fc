//! Development certificate generation using rcgen.
//!
//! Generates a self-signed CA plus a server certificate for local stall
//! setups and testing. NOT suitable for production use.

use std::path::Path;

use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair,
    KeyUsagePurpose,
};
use tracing::info;

/// Generated certificate bundle (PEM-encoded).
pub struct CertBundle {
    /// CA certificate PEM.
    pub ca_cert_pem: String,
    /// Server certificate PEM.
    pub server_cert_pem: String,
    /// Server private key PEM.
    pub server_key_pem: String,
}

/// Generate a full dev certificate bundle (CA + server).
pub fn generate_dev_bundle(server_names: &[&str]) -> Result<CertBundle, CertError> {
    let mut ca_params =
        CertificateParams::new(Vec::new()).map_err(|e| CertError::Generation(e.to_string()))?;
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Wardrobe Dev CA");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.key_usages.push(KeyUsagePurpose::KeyCertSign);

    let ca_key = KeyPair::generate().map_err(|e| CertError::Generation(e.to_string()))?;
    let ca_cert = ca_params
        .self_signed(&ca_key)
        .map_err(|e| CertError::Generation(e.to_string()))?;
    let ca_cert_pem = ca_cert.pem();

    let issuer = Issuer::from_params(&ca_params, &ca_key);

    let mut params = CertificateParams::new(
        server_names
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
    )
    .map_err(|e| CertError::Generation(e.to_string()))?;
    params
        .distinguished_name
        .push(DnType::CommonName, "Wardrobe Relay Server");
    params
        .extended_key_usages
        .push(ExtendedKeyUsagePurpose::ServerAuth);

    let server_key = KeyPair::generate().map_err(|e| CertError::Generation(e.to_string()))?;
    let server_cert = params
        .signed_by(&server_key, &issuer)
        .map_err(|e| CertError::Generation(e.to_string()))?;

    Ok(CertBundle {
        ca_cert_pem,
        server_cert_pem: server_cert.pem(),
        server_key_pem: server_key.serialize_pem(),
    })
}

/// Write a dev certificate bundle to disk.
pub fn write_dev_certs(dir: &Path, bundle: &CertBundle) -> Result<(), CertError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CertError::Io(format!("Failed to create cert dir: {e}")))?;

    let ca_path = dir.join("ca.pem");
    let cert_path = dir.join("server.pem");
    let key_path = dir.join("server-key.pem");

    std::fs::write(&ca_path, &bundle.ca_cert_pem)
        .map_err(|e| CertError::Io(format!("Failed to write CA cert: {e}")))?;
    std::fs::write(&cert_path, &bundle.server_cert_pem)
        .map_err(|e| CertError::Io(format!("Failed to write server cert: {e}")))?;
    std::fs::write(&key_path, &bundle.server_key_pem)
        .map_err(|e| CertError::Io(format!("Failed to write server key: {e}")))?;

    info!(
        ca = %ca_path.display(),
        cert = %cert_path.display(),
        key = %key_path.display(),
        "Dev certificates written"
    );

    Ok(())
}

/// Certificate generation errors.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Certificate generation error: {0}")]
    Generation(String),

    #[error("I/O error: {0}")]
    Io(String),
}
