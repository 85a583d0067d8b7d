//! # Initialization
//!
//! Process initialization: rustls setup, tracing, and Kubernetes client creation.

use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::{Context, Result};
use kube::Client;
use tracing::{info, warn};

/// Configure rustls crypto provider
///
/// Required for rustls 0.23+ when no default provider is set via features.
/// Must run before any Kubernetes connection is made. We use ring as the crypto provider.
pub fn install_crypto_provider() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_existing| anyhow::anyhow!("Failed to install rustls crypto provider"))
}

/// Set up the tracing subscriber
///
/// Logs go to stderr; stdout is reserved for the JSON document.
pub fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
    {
        warn!("Tracing subscriber init returned error (may already be initialized): {}", e);
    }
}

/// Create the Kubernetes client from the ambient kubeconfig or in-cluster config
pub async fn create_client() -> Result<Client> {
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    info!("Connected to Kubernetes API server");
    Ok(client)
}
