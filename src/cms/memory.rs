use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;

use super::{ContentEntry, ContentQuery, ContentStore, merge_data};
use crate::errors::{Result, TalentenraadError};

/// In-process content store
///
/// Used when no CMS key is configured, and by tests.
#[derive(Default)]
pub struct MemoryContentStore {
    /// model -> id -> entry
    entries: RwLock<BTreeMap<String, BTreeMap<String, ContentEntry<Value>>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry with a fixed id
    pub fn insert(&self, entry: ContentEntry<Value>) {
        self.entries
            .write()
            .entry(entry.model.clone())
            .or_default()
            .insert(entry.id.clone(), entry);
    }

    fn modify<F>(&self, model: &str, id: &str, f: F) -> Result<ContentEntry<Value>>
    where
        F: FnOnce(&mut ContentEntry<Value>),
    {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(model)
            .and_then(|m| m.get_mut(id))
            .ok_or_else(|| TalentenraadError::not_found(format!("{} {} not found", model, id)))?;
        f(entry);
        entry.updated_at = Some(Utc::now());
        Ok(entry.clone())
    }
}

fn matches(entry: &ContentEntry<Value>, query: &ContentQuery) -> bool {
    (query.include_unpublished || entry.published)
        && query.filters.iter().all(|(field, expected)| {
            match entry.data.get(field) {
                Some(Value::String(s)) => s == expected,
                Some(other) => other.to_string() == *expected,
                None => false,
            }
        })
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list(&self, model: &str, query: &ContentQuery) -> Result<Vec<ContentEntry<Value>>> {
        let entries = self.entries.read();
        Ok(entries
            .get(model)
            .map(|m| {
                m.values()
                    .filter(|e| matches(e, query))
                    .skip(query.offset as usize)
                    .take(query.limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, model: &str, id: &str) -> Result<Option<ContentEntry<Value>>> {
        Ok(self
            .entries
            .read()
            .get(model)
            .and_then(|m| m.get(id))
            .cloned())
    }

    async fn create(
        &self,
        model: &str,
        name: &str,
        data: Value,
        published: bool,
    ) -> Result<ContentEntry<Value>> {
        let now = Utc::now();
        let entry = ContentEntry {
            id: uuid::Uuid::new_v4().simple().to_string(),
            model: model.to_string(),
            name: name.to_string(),
            published,
            data,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.insert(entry.clone());
        Ok(entry)
    }

    async fn update(&self, model: &str, id: &str, data: Value) -> Result<ContentEntry<Value>> {
        self.modify(model, id, |entry| merge_data(&mut entry.data, data))
    }

    async fn replace(&self, model: &str, id: &str, data: Value) -> Result<ContentEntry<Value>> {
        self.modify(model, id, |entry| entry.data = data)
    }

    async fn delete(&self, model: &str, id: &str) -> Result<()> {
        let removed = self
            .entries
            .write()
            .get_mut(model)
            .and_then(|m| m.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(TalentenraadError::not_found(format!(
                "{} {} not found",
                model, id
            ))),
        }
    }
}
