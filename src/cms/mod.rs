//! Headless CMS access
//!
//! `ContentStore` is the seam to the content backend. `BuilderClient` talks
//! to Builder.io; `MemoryContentStore` keeps content in process for local
//! development and tests.

mod builder;
mod memory;
pub mod models;
mod service;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

pub use builder::BuilderClient;
pub use memory::MemoryContentStore;
pub use models::{
    Activity, Announcement, AnnouncementKind, ContentEntry, NewsItem, Page, MODEL_ACTIVITY,
    MODEL_ANNOUNCEMENT, MODEL_NEWS, MODEL_PAGE,
};
pub use service::ContentService;

/// Listing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    pub limit: u32,
    pub offset: u32,
    /// Include drafts (admin listings); never served from cache
    pub include_unpublished: bool,
    /// `data.<field> == value` filters
    pub filters: Vec<(String, String)>,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            include_unpublished: false,
            filters: Vec::new(),
        }
    }
}

impl ContentQuery {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, 100);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_unpublished(mut self) -> Self {
        self.include_unpublished = true;
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Stable cache key
    pub fn cache_key(&self, model: &str) -> String {
        let filters: Vec<String> = self
            .filters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!(
            "{}|l={}|o={}|u={}|{}",
            model,
            self.limit,
            self.offset,
            self.include_unpublished,
            filters.join("&")
        )
    }
}

/// Read/write access to CMS records
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list(&self, model: &str, query: &ContentQuery) -> Result<Vec<ContentEntry<Value>>>;

    async fn get(&self, model: &str, id: &str) -> Result<Option<ContentEntry<Value>>>;

    async fn get_by_url(&self, model: &str, url: &str) -> Result<Option<ContentEntry<Value>>> {
        let query = ContentQuery::default().limit(1).filter("url", url);
        Ok(self.list(model, &query).await?.into_iter().next())
    }

    async fn create(
        &self,
        model: &str,
        name: &str,
        data: Value,
        published: bool,
    ) -> Result<ContentEntry<Value>>;

    /// Merge the given top-level `data` fields into the record
    async fn update(&self, model: &str, id: &str, data: Value) -> Result<ContentEntry<Value>>;

    /// Replace the whole `data` object
    async fn replace(&self, model: &str, id: &str, data: Value) -> Result<ContentEntry<Value>>;

    async fn delete(&self, model: &str, id: &str) -> Result<()>;
}

/// Shallow merge of `patch` into `target`; both must be objects
pub fn merge_data(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(obj), Value::Object(fields)) => {
            for (k, v) in fields {
                obj.insert(k, v);
            }
        }
        (_, patch) => *target = patch,
    }
}
