use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::api::AppState;
use crate::cms::{BuilderClient, ContentStore, MemoryContentStore};
use crate::config::{CmsConfig, PushConfig, StaticConfig};
use crate::notifications::{PushGateway, VapidSigner, WebPushClient};
use crate::storage::StorageFactory;

/// Prepare the server context: database, content backend, push and shared state
pub async fn prepare_server_startup(config: Arc<StaticConfig>) -> Result<AppState> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using database backend: {}", storage.backend_name());

    let content_store = build_content_store(&config.cms);
    let gateway = build_push_gateway(&config.push);

    let state = AppState::build(config, storage, content_store, gateway)
        .await
        .context("Failed to build application state")?;

    debug!("Pre-startup finished in {:?}", start_time.elapsed());
    Ok(state)
}

/// Builder.io when a public key is configured, otherwise an in-memory store
pub fn build_content_store(config: &CmsConfig) -> Arc<dyn ContentStore> {
    if config.public_key.is_empty() {
        warn!("cms.public_key is not set, serving content from an empty in-memory store");
        Arc::new(MemoryContentStore::new())
    } else {
        info!("Content backend: {}", config.api_url);
        Arc::new(BuilderClient::new(config))
    }
}

/// `None` when the VAPID key pair is missing or unusable
pub fn build_push_gateway(config: &PushConfig) -> Option<Arc<dyn PushGateway>> {
    if config.vapid_public_key.is_empty() || config.vapid_private_key_pem.is_empty() {
        return None;
    }
    match VapidSigner::from_config(config) {
        Ok(signer) => Some(Arc::new(WebPushClient::new(Arc::new(signer)))),
        Err(e) => {
            error!("Invalid VAPID configuration, push disabled: {}", e);
            None
        }
    }
}
