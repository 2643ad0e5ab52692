//! Shared blocking HTTP agent for outbound calls
//!
//! All outbound HTTP (CMS, reCAPTCHA, push services, edit-mode client) goes
//! through `ureq` on the blocking thread pool.

use std::sync::OnceLock;
use std::time::Duration;

use ureq::Agent;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

/// Agent that reports 4xx/5xx as normal responses so callers can map them
pub fn agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
}

pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Run a blocking HTTP call on the blocking pool
pub async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("blocking HTTP task failed: {}", e))?
}
