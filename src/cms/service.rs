use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::{
    Activity, Announcement, ContentEntry, ContentQuery, ContentStore, MODEL_ACTIVITY,
    MODEL_ANNOUNCEMENT, MODEL_NEWS, MODEL_PAGE, NewsItem, Page,
};
use crate::errors::Result;

/// Typed reads on top of a `ContentStore`
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    tz: Tz,
}

/// Records whose data does not match the model are skipped, not fatal
fn decode_all<T: DeserializeOwned>(entries: Vec<ContentEntry<Value>>) -> Vec<ContentEntry<T>> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id.clone();
            let model = entry.model.clone();
            match entry.decode::<T>() {
                Ok(typed) => Some(typed),
                Err(e) => {
                    warn!("Skipping {} {}: {}", model, id, e);
                    None
                }
            }
        })
        .collect()
}

impl ContentService {
    /// `tz` is the site timezone used to decide calendar days
    pub fn new(store: Arc<dyn ContentStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Newest news first
    pub async fn news(&self, limit: u32) -> Result<Vec<ContentEntry<NewsItem>>> {
        let entries = self
            .store
            .list(MODEL_NEWS, &ContentQuery::default().limit(100))
            .await?;
        let mut news = decode_all::<NewsItem>(entries);
        news.sort_by(|a, b| {
            let ka = a.data.published_at.or(a.created_at);
            let kb = b.data.published_at.or(b.created_at);
            kb.cmp(&ka)
        });
        news.truncate(limit as usize);
        Ok(news)
    }

    /// All published activities ordered by start
    pub async fn activities(&self) -> Result<Vec<ContentEntry<Activity>>> {
        let entries = self
            .store
            .list(MODEL_ACTIVITY, &ContentQuery::default().limit(100))
            .await?;
        let mut activities = decode_all::<Activity>(entries);
        activities.sort_by(|a, b| a.data.start.cmp(&b.data.start).then(a.id.cmp(&b.id)));
        Ok(activities)
    }

    /// Activities that have not ended yet
    pub async fn activities_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<ContentEntry<Activity>>> {
        Ok(self
            .activities()
            .await?
            .into_iter()
            .filter(|a| a.data.is_upcoming(now, self.tz))
            .collect())
    }

    /// Announcements inside their active window, most urgent first
    pub async fn active_announcements(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentEntry<Announcement>>> {
        let entries = self
            .store
            .list(MODEL_ANNOUNCEMENT, &ContentQuery::default().limit(100))
            .await?;
        let mut active: Vec<_> = decode_all::<Announcement>(entries)
            .into_iter()
            .filter(|a| a.data.is_active(now))
            .collect();
        active.sort_by(|a, b| b.data.kind.cmp(&a.data.kind));
        Ok(active)
    }

    pub async fn page(&self, url: &str) -> Result<Option<ContentEntry<Page>>> {
        let url = if url.is_empty() { "/" } else { url };
        let entry = self.store.get_by_url(MODEL_PAGE, url).await?;
        Ok(entry.and_then(|e| decode_all::<Page>(vec![e]).into_iter().next()))
    }
}
