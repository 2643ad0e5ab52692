use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::session::SessionVerifier;
use crate::claps::ClapService;
use crate::cms::{ContentService, ContentStore};
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::notifications::{NotificationService, PushGateway};
use crate::recaptcha::RecaptchaVerifier;
use crate::settings::SiteSettings;
use crate::storage::SeaOrmStorage;

/// Services shared by all handlers (`web::Data<AppState>`)
pub struct AppState {
    pub config: Arc<StaticConfig>,
    pub storage: Arc<SeaOrmStorage>,
    pub content: ContentService,
    pub claps: ClapService,
    pub notifications: NotificationService,
    /// `false` when no VAPID keys are configured; broadcasts are refused
    pub push_enabled: bool,
    pub settings: SiteSettings,
    pub recaptcha: RecaptchaVerifier,
    pub sessions: SessionVerifier,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the services; `gateway` is `None` when push is not configured
    pub async fn build(
        config: Arc<StaticConfig>,
        storage: Arc<SeaOrmStorage>,
        content_store: Arc<dyn ContentStore>,
        gateway: Option<Arc<dyn PushGateway>>,
    ) -> Result<Self> {
        let settings = SiteSettings::load(storage.clone()).await?;

        let push_enabled = gateway.is_some();
        let gateway = gateway.unwrap_or_else(|| {
            warn!("Push notifications disabled: no VAPID keys configured");
            Arc::new(crate::notifications::UnconfiguredGateway)
        });
        let notifications = NotificationService::new(
            storage.clone(),
            gateway,
            Duration::from_secs(config.push.ttl_secs),
            config.push.concurrency,
        );

        let recaptcha = RecaptchaVerifier::new(&config.recaptcha);

        info!(
            "Application state ready (db: {}, push: {})",
            storage.backend_name(),
            push_enabled
        );

        Ok(Self {
            content: ContentService::new(content_store, config.server.tz()),
            claps: ClapService::new(storage.clone(), config.claps.max_per_session),
            notifications,
            push_enabled,
            settings,
            recaptcha,
            sessions: SessionVerifier::from_config(&config.auth),
            started_at: Utc::now(),
            storage,
            config,
        })
    }
}
