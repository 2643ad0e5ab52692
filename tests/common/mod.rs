//! Shared setup for the HTTP integration tests
//!
//! Every test gets its own SQLite file in a temp dir, an in-memory content
//! store and a recording push gateway.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::TempDir;

use talentenraad::api::AppState;
use talentenraad::cms::{ContentEntry, MemoryContentStore};
use talentenraad::config::StaticConfig;
use talentenraad::notifications::{DeliveryResult, PushGateway};
use talentenraad::storage::{PushSubscriptionRecord, SeaOrmStorage};

pub const SESSION_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "voorzitter@talentenraad.be";

/// Push gateway that records deliveries; endpoints in `gone` answer 410
#[derive(Default)]
pub struct RecordingGateway {
    pub delivered: Mutex<Vec<String>>,
    pub gone: Mutex<HashSet<String>>,
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn deliver(&self, subscription: &PushSubscriptionRecord, _ttl: Duration) -> DeliveryResult {
        if self.gone.lock().contains(&subscription.endpoint) {
            return DeliveryResult::Gone;
        }
        self.delivered.lock().push(subscription.endpoint.clone());
        DeliveryResult::Delivered
    }
}

pub struct TestEnv {
    pub state: web::Data<AppState>,
    pub content: Arc<MemoryContentStore>,
    pub gateway: Arc<RecordingGateway>,
    _dir: TempDir,
}

impl TestEnv {
    pub fn storage(&self) -> Arc<SeaOrmStorage> {
        self.state.storage.clone()
    }

    /// Session token as the auth provider would issue it
    pub fn session_for(&self, email: &str) -> String {
        self.state
            .sessions
            .issue("auth-subject", email, Some("Test"), chrono::Duration::hours(1))
            .expect("issue session")
    }

    pub fn admin_session(&self) -> String {
        self.session_for(ADMIN_EMAIL)
    }

    pub fn session_cookie_name(&self) -> String {
        self.state.config.auth.session_cookie.clone()
    }
}

pub fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.auth.session_secret = SESSION_SECRET.to_string();
    config.auth.admin_emails = vec![ADMIN_EMAIL.to_string()];
    config.claps.max_per_session = 10;
    config.claps.cookie_secure = false;
    config
}

pub async fn setup() -> TestEnv {
    setup_with(test_config(), true).await
}

pub async fn setup_with(config: StaticConfig, push: bool) -> TestEnv {
    let dir = TempDir::new().expect("temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("storage"),
    );

    let content = Arc::new(MemoryContentStore::new());
    let gateway = Arc::new(RecordingGateway::default());
    let push_gateway: Option<Arc<dyn PushGateway>> = if push {
        Some(gateway.clone())
    } else {
        None
    };

    let state = AppState::build(Arc::new(config), storage, content.clone(), push_gateway)
        .await
        .expect("app state");

    TestEnv {
        state: web::Data::new(state),
        content,
        gateway,
        _dir: dir,
    }
}

pub fn entry(model: &str, id: &str, name: &str, published: bool, data: Value) -> ContentEntry<Value> {
    ContentEntry {
        id: id.to_string(),
        model: model.to_string(),
        name: name.to_string(),
        published,
        data,
        created_at: None,
        updated_at: None,
    }
}

pub fn news(id: &str, title: &str) -> ContentEntry<Value> {
    entry(
        "nieuws",
        id,
        title,
        true,
        json!({ "title": title, "summary": "Kort", "publishedAt": "2024-10-01T08:00:00Z" }),
    )
}

/// Build the full `/api` app around a test env
#[macro_export]
macro_rules! api_app {
    ($env:expr) => {{
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($env.state.clone())
                .configure(talentenraad::api::configure),
        )
        .await
    }};
}
