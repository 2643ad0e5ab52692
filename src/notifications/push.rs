use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::VapidSigner;
use crate::storage::PushSubscriptionRecord;

/// Outcome of one push attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    /// Subscription expired or was revoked; it should be removed
    Gone,
    Failed(String),
}

impl DeliveryResult {
    /// Map a push service response status
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=202 => DeliveryResult::Delivered,
            404 | 410 => DeliveryResult::Gone,
            other => DeliveryResult::Failed(format!("push service answered {}", other)),
        }
    }
}

/// Delivers one push message to one subscription
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn deliver(&self, subscription: &PushSubscriptionRecord, ttl: Duration) -> DeliveryResult;
}

/// Sends empty-body Web Push messages with VAPID authorization
///
/// The service worker reacts to the push by fetching
/// `/api/notifications/latest`, so no payload encryption is needed.
pub struct WebPushClient {
    signer: Arc<VapidSigner>,
}

impl WebPushClient {
    pub fn new(signer: Arc<VapidSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl PushGateway for WebPushClient {
    async fn deliver(&self, subscription: &PushSubscriptionRecord, ttl: Duration) -> DeliveryResult {
        let authorization = match self.signer.authorization(&subscription.endpoint) {
            Ok(a) => a,
            Err(e) => return DeliveryResult::Failed(e.to_string()),
        };
        let endpoint = subscription.endpoint.clone();
        let ttl = ttl.as_secs().to_string();

        let status = crate::http::blocking(move || {
            let resp = crate::http::agent()
                .post(&endpoint)
                .header("Authorization", &authorization)
                .header("TTL", &ttl)
                .header("Urgency", "normal")
                .send_empty()?;
            Ok(resp.status().as_u16())
        })
        .await;

        match status {
            Ok(code) => {
                trace!("Push to subscription {} answered {}", subscription.id, code);
                DeliveryResult::from_status(code)
            }
            Err(e) => {
                debug!("Push to subscription {} failed: {}", subscription.id, e);
                DeliveryResult::Failed(e.to_string())
            }
        }
    }
}

/// Stand-in when no VAPID keys are configured
pub struct UnconfiguredGateway;

#[async_trait]
impl PushGateway for UnconfiguredGateway {
    async fn deliver(&self, _subscription: &PushSubscriptionRecord, _ttl: Duration) -> DeliveryResult {
        DeliveryResult::Failed("push is not configured".to_string())
    }
}
