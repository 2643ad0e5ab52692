use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::{DeliveryResult, PushGateway};
use crate::errors::{Result, TalentenraadError};
use crate::storage::{NewAuditEntry, NotificationRecord, SeaOrmStorage};

const MAX_TITLE_LEN: usize = 120;
const MAX_BODY_LEN: usize = 1_000;

/// Result of a broadcast
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub notification: NotificationRecord,
    pub sent: usize,
    pub failed: usize,
    pub removed: usize,
}

pub struct NotificationService {
    storage: Arc<SeaOrmStorage>,
    gateway: Arc<dyn PushGateway>,
    ttl: Duration,
    concurrency: usize,
}

impl NotificationService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        gateway: Arc<dyn PushGateway>,
        ttl: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            storage,
            gateway,
            ttl,
            concurrency: concurrency.max(1),
        }
    }

    fn validate(title: &str, body: &str, url: Option<&str>) -> Result<()> {
        if title.trim().is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(TalentenraadError::validation(format!(
                "title is required (max {} characters)",
                MAX_TITLE_LEN
            )));
        }
        if body.chars().count() > MAX_BODY_LEN {
            return Err(TalentenraadError::validation(format!(
                "body is too long (max {} characters)",
                MAX_BODY_LEN
            )));
        }
        if let Some(url) = url
            && !(url.starts_with('/') || url.starts_with("https://"))
        {
            return Err(TalentenraadError::validation(
                "url must be a site path or https URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Push a notification to every subscriber
    ///
    /// The history row is written before delivery because the service
    /// worker fetches it as soon as the push arrives.
    pub async fn broadcast(
        &self,
        title: &str,
        body: &str,
        url: Option<String>,
        sent_by: &str,
    ) -> Result<BroadcastReport> {
        Self::validate(title, body, url.as_deref())?;

        let mut notification = self
            .storage
            .insert_notification(title.trim(), body.trim(), url, sent_by, 0, 0)
            .await?;

        let subscriptions = self.storage.list_push_subscriptions().await?;
        let total = subscriptions.len();
        let gateway = &self.gateway;
        let ttl = self.ttl;

        let results: Vec<(i64, DeliveryResult)> = stream::iter(subscriptions)
            .map(|sub| async move {
                let result = gateway.deliver(&sub, ttl).await;
                (sub.id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut delivered = Vec::new();
        let mut gone = Vec::new();
        let mut failed = 0usize;
        for (id, result) in results {
            match result {
                DeliveryResult::Delivered => delivered.push(id),
                DeliveryResult::Gone => gone.push(id),
                DeliveryResult::Failed(reason) => {
                    failed += 1;
                    warn!("Push to subscription {} failed: {}", id, reason);
                }
            }
        }

        let removed = self.storage.delete_push_subscriptions(&gone).await? as usize;
        self.storage.mark_push_subscriptions_used(&delivered).await?;

        notification.sent_count = delivered.len() as i32;
        notification.failed_count = (failed + gone.len()) as i32;
        self.storage
            .update_notification_counts(
                notification.id,
                notification.sent_count,
                notification.failed_count,
            )
            .await?;

        if let Err(e) = self
            .storage
            .record_audit(
                NewAuditEntry::new(sent_by, "notification.broadcast", "notification")
                    .resource(notification.id.to_string())
                    .details(json!({
                        "title": notification.title,
                        "subscribers": total,
                        "sent": delivered.len(),
                        "failed": failed,
                        "removed": removed,
                    })),
            )
            .await
        {
            warn!("Failed to write audit entry for notification {}: {}", notification.id, e);
        }

        info!(
            "Notification '{}' pushed to {}/{} subscriber(s), {} removed",
            notification.title,
            delivered.len(),
            total,
            removed
        );

        Ok(BroadcastReport {
            sent: delivered.len(),
            failed,
            removed,
            notification,
        })
    }

    pub async fn latest(&self) -> Result<Option<NotificationRecord>> {
        self.storage.latest_notification().await
    }

    pub async fn history(&self, limit: u64) -> Result<Vec<NotificationRecord>> {
        self.storage.notification_history(limit.clamp(1, 200)).await
    }

    pub async fn subscribe(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        user_agent: Option<String>,
    ) -> Result<()> {
        check_endpoint(endpoint)?;
        if p256dh.trim().is_empty() || auth.trim().is_empty() {
            return Err(TalentenraadError::validation(
                "subscription keys p256dh and auth are required".to_string(),
            ));
        }
        let user_agent = user_agent.map(|ua| ua.chars().take(255).collect());
        self.storage
            .upsert_push_subscription(endpoint, p256dh, auth, user_agent)
            .await
    }

    pub async fn unsubscribe(&self, endpoint: &str) -> Result<bool> {
        self.storage.delete_push_subscription(endpoint).await
    }
}

fn check_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.len() > 700 {
        return Err(TalentenraadError::validation(
            "push endpoint is too long".to_string(),
        ));
    }
    super::VapidSigner::audience(endpoint).map(|_| ())
}
