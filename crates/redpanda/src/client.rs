//! Connection setup shared by the producer and the health check.

use std::sync::Arc;

use gateway_core::{Error, Result};
use rskafka::client::{Client, ClientBuilder, Credentials, SaslConfig};

use crate::config::RedpandaConfig;

/// Creates a TLS configuration for Redpanda Cloud.
fn create_tls_config() -> Arc<rustls::ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Connect to the configured brokers, with TLS and SASL when credentials are set.
pub async fn connect(config: &RedpandaConfig) -> Result<Client> {
    let mut builder = ClientBuilder::new(vec![config.broker_string()]);

    if let Some((username, password)) = config.credentials() {
        builder = builder
            .tls_config(create_tls_config())
            .sasl_config(SaslConfig::ScramSha256(Credentials::new(
                username.to_string(),
                password.to_string(),
            )));
    }

    builder
        .build()
        .await
        .map_err(|e| Error::forwarding(format!("failed to connect to Redpanda: {}", e)))
}
