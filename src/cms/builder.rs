//! Builder.io client
//!
//! Reads go to the content API with the public key, writes go to the write
//! API with the private key. Published listings are cached in moka for
//! `cms.cache_ttl_secs`; every write clears the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde_json::{Value, json};
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::models::flexible_datetime;
use super::{ContentEntry, ContentQuery, ContentStore};
use crate::config::CmsConfig;
use crate::errors::{Result, TalentenraadError};

const CACHE_MAX_CAPACITY: u64 = 1_000;

type EntryList = Arc<Vec<ContentEntry<Value>>>;

pub struct BuilderClient {
    api_url: String,
    write_url: String,
    public_key: String,
    private_key: String,
    agent: Agent,
    list_cache: Cache<String, EntryList>,
}

/// Convert one raw API record
fn parse_entry(model: &str, raw: &Value) -> Option<ContentEntry<Value>> {
    let id = raw.get("id")?.as_str()?.to_string();
    let timestamp = |field: &str| -> Option<DateTime<Utc>> {
        raw.get(field).and_then(flexible_datetime::parse)
    };
    Some(ContentEntry {
        id,
        model: model.to_string(),
        name: raw["name"].as_str().unwrap_or_default().to_string(),
        published: raw["published"].as_str() == Some("published"),
        data: raw.get("data").cloned().unwrap_or_else(|| json!({})),
        created_at: timestamp("createdDate"),
        updated_at: timestamp("lastUpdated"),
    })
}

fn status_error(action: &str, status: u16, body: &str) -> TalentenraadError {
    match status {
        404 => TalentenraadError::not_found(format!("CMS {}: not found", action)),
        401 | 403 => TalentenraadError::cms(format!("CMS {}: credentials rejected", action)),
        _ => TalentenraadError::cms(format!("CMS {} failed ({}): {}", action, status, body)),
    }
}

impl BuilderClient {
    pub fn new(config: &CmsConfig) -> Self {
        let list_cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.cache_ttl_secs.max(1)))
            .max_capacity(CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            write_url: config.write_url.trim_end_matches('/').to_string(),
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
            agent: crate::http::build_agent(Duration::from_secs(config.timeout_secs.max(1))),
            list_cache,
        }
    }

    fn list_url(&self, model: &str, query: &ContentQuery) -> String {
        let mut url = format!(
            "{}/{}?apiKey={}&limit={}&offset={}",
            self.api_url,
            urlencoding::encode(model),
            urlencoding::encode(&self.public_key),
            query.limit,
            query.offset
        );
        for (field, value) in &query.filters {
            url.push_str(&format!(
                "&query.data.{}={}",
                urlencoding::encode(field),
                urlencoding::encode(value)
            ));
        }
        if query.include_unpublished {
            url.push_str("&includeUnpublished=true&cachebust=true");
        }
        url
    }

    fn item_url(&self, base: &str, model: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            base,
            urlencoding::encode(model),
            urlencoding::encode(id)
        )
    }

    /// GET returning `(status, body)`
    async fn get_json(&self, url: String) -> Result<(u16, Value)> {
        let agent = self.agent.clone();
        crate::http::blocking(move || {
            let resp = agent.get(&url).call()?;
            let status = resp.status().as_u16();
            let body: Value = resp.into_body().read_json().unwrap_or(Value::Null);
            Ok((status, body))
        })
        .await
        .map_err(|e| TalentenraadError::cms(format!("CMS request failed: {}", e)))
    }

    /// Authenticated write returning `(status, body)`
    async fn write(&self, method: &'static str, url: String, body: Option<Value>) -> Result<(u16, Value)> {
        if self.private_key.is_empty() {
            return Err(TalentenraadError::cms(
                "cms.private_key is not configured; content is read-only".to_string(),
            ));
        }
        let agent = self.agent.clone();
        let auth = format!("Bearer {}", self.private_key);
        crate::http::blocking(move || {
            let resp = match (method, body) {
                ("DELETE", _) => agent.delete(&url).header("Authorization", &auth).call()?,
                ("POST", Some(b)) => agent.post(&url).header("Authorization", &auth).send_json(&b)?,
                ("PATCH", Some(b)) => agent.patch(&url).header("Authorization", &auth).send_json(&b)?,
                ("PUT", Some(b)) => agent.put(&url).header("Authorization", &auth).send_json(&b)?,
                (m, _) => anyhow::bail!("unsupported CMS write {}", m),
            };
            let status = resp.status().as_u16();
            let body: Value = resp.into_body().read_json().unwrap_or(Value::Null);
            Ok((status, body))
        })
        .await
        .map_err(|e| TalentenraadError::cms(format!("CMS write failed: {}", e)))
    }

    async fn fetch_list(&self, model: &str, query: &ContentQuery) -> Result<Vec<ContentEntry<Value>>> {
        let (status, body) = self.get_json(self.list_url(model, query)).await?;
        if status != 200 {
            return Err(status_error("list", status, &body.to_string()));
        }
        let entries: Vec<ContentEntry<Value>> = body["results"]
            .as_array()
            .map(|items| items.iter().filter_map(|raw| parse_entry(model, raw)).collect())
            .unwrap_or_default();
        trace!("CMS returned {} {} entries", entries.len(), model);
        Ok(entries)
    }

    fn invalidate(&self) {
        self.list_cache.invalidate_all();
        debug!("CMS cache invalidated");
    }

    /// After a write the API returns the stored record (or nothing)
    async fn written_entry(&self, model: &str, id: &str, body: &Value) -> Result<ContentEntry<Value>> {
        if let Some(entry) = parse_entry(model, body) {
            return Ok(entry);
        }
        self.get(model, id)
            .await?
            .ok_or_else(|| TalentenraadError::not_found(format!("{} {} not found", model, id)))
    }
}

#[async_trait]
impl ContentStore for BuilderClient {
    async fn list(&self, model: &str, query: &ContentQuery) -> Result<Vec<ContentEntry<Value>>> {
        if query.include_unpublished {
            return self.fetch_list(model, query).await;
        }

        let key = query.cache_key(model);
        let entries = self
            .list_cache
            .try_get_with(key, async {
                self.fetch_list(model, query).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<TalentenraadError>| (*e).clone())?;
        Ok(entries.as_ref().clone())
    }

    async fn get(&self, model: &str, id: &str) -> Result<Option<ContentEntry<Value>>> {
        let url = format!(
            "{}?apiKey={}&includeUnpublished=true&cachebust=true",
            self.item_url(&self.api_url, model, id),
            urlencoding::encode(&self.public_key)
        );
        let (status, body) = self.get_json(url).await?;
        match status {
            200 => Ok(parse_entry(model, &body)),
            404 => Ok(None),
            _ => Err(status_error("get", status, &body.to_string())),
        }
    }

    async fn create(
        &self,
        model: &str,
        name: &str,
        data: Value,
        published: bool,
    ) -> Result<ContentEntry<Value>> {
        let url = format!("{}/{}", self.write_url, urlencoding::encode(model));
        let body = json!({
            "name": name,
            "data": data,
            "published": if published { "published" } else { "draft" },
        });
        let (status, resp) = self.write("POST", url, Some(body)).await?;
        if !(200..300).contains(&status) {
            return Err(status_error("create", status, &resp.to_string()));
        }
        self.invalidate();
        let id = resp["id"].as_str().unwrap_or_default().to_string();
        self.written_entry(model, &id, &resp).await
    }

    async fn update(&self, model: &str, id: &str, data: Value) -> Result<ContentEntry<Value>> {
        let url = self.item_url(&self.write_url, model, id);
        let (status, resp) = self
            .write("PATCH", url, Some(json!({ "data": data })))
            .await?;
        if !(200..300).contains(&status) {
            return Err(status_error("update", status, &resp.to_string()));
        }
        self.invalidate();
        self.written_entry(model, id, &resp).await
    }

    async fn replace(&self, model: &str, id: &str, data: Value) -> Result<ContentEntry<Value>> {
        let existing = self
            .get(model, id)
            .await?
            .ok_or_else(|| TalentenraadError::not_found(format!("{} {} not found", model, id)))?;
        let url = self.item_url(&self.write_url, model, id);
        let body = json!({
            "name": existing.name,
            "data": data,
            "published": if existing.published { "published" } else { "draft" },
        });
        let (status, resp) = self.write("PUT", url, Some(body)).await?;
        if !(200..300).contains(&status) {
            return Err(status_error("replace", status, &resp.to_string()));
        }
        self.invalidate();
        self.written_entry(model, id, &resp).await
    }

    async fn delete(&self, model: &str, id: &str) -> Result<()> {
        let url = self.item_url(&self.write_url, model, id);
        let (status, resp) = self.write("DELETE", url, None).await?;
        if !(200..300).contains(&status) {
            warn!("CMS delete of {} {} returned {}", model, id, status);
            return Err(status_error("delete", status, &resp.to_string()));
        }
        self.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BuilderClient {
        BuilderClient::new(&CmsConfig {
            public_key: "pub key".into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_list_url() {
        let query = ContentQuery::default().limit(5).filter("url", "/over ons");
        let url = client().list_url("page", &query);
        assert!(url.starts_with("https://cdn.builder.io/api/v3/content/page?apiKey=pub%20key"));
        assert!(url.contains("&limit=5&offset=0"));
        assert!(url.contains("&query.data.url=%2Fover%20ons"));
        assert!(!url.contains("includeUnpublished"));
    }

    #[test]
    fn test_parse_entry() {
        let raw = json!({
            "id": "f00",
            "name": "Kerstmarkt",
            "published": "published",
            "createdDate": 1700000000000i64,
            "data": {"title": "Kerstmarkt"}
        });
        let entry = parse_entry("activiteit", &raw).unwrap();
        assert_eq!(entry.id, "f00");
        assert!(entry.published);
        assert!(entry.created_at.is_some());
        assert!(entry.updated_at.is_none());
        assert!(parse_entry("activiteit", &json!({"name": "no id"})).is_none());
    }

    #[tokio::test]
    async fn test_writes_require_private_key() {
        let err = client()
            .create("nieuws", "x", json!({}), false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E010");
    }
}
