//! TLS support for the relay server.

mod certs;
mod config;

pub use certs::{CertBundle, CertError, generate_dev_bundle, write_dev_certs};
pub use config::{TlsConfigError, TlsMode};
