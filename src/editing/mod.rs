//! Edit-mode change aggregation
//!
//! While an editor works in edit mode, every field edit is registered here
//! instead of being written to the CMS immediately. On save, the edits are
//! grouped per content item and each group is persisted with one request.
//!
//! Invariants:
//! - at most one pending entry per `(content_id, field)`
//! - no entry whose `value` equals its `original_value`
//! - a save either clears everything (all groups stored) or nothing

mod saver;

use std::collections::BTreeMap;
use std::fmt;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use saver::{ChangeSaver, HttpChangeSaver};

/// `"<content_id>:<field>"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeKey {
    pub content_id: String,
    pub field: String,
}

impl ChangeKey {
    pub fn new(content_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_id, self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub content_id: String,
    pub model: String,
    pub field: String,
    pub value: Value,
    pub original_value: Value,
}

impl PendingChange {
    pub fn key(&self) -> ChangeKey {
        ChangeKey::new(self.content_id.clone(), self.field.clone())
    }

    fn is_noop(&self) -> bool {
        self.value == self.original_value
    }
}

/// All pending edits of one content item, saved with one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeBatch {
    pub content_id: String,
    pub model: String,
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct SaveOutcome {
    pub saved_batches: usize,
    /// `(content_id, error)` per failed group
    pub failed: Vec<(String, String)>,
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
pub struct PendingChanges {
    entries: BTreeMap<ChangeKey, PendingChange>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the edit for its key
    ///
    /// An existing entry keeps its first `original_value`, so editing a field
    /// back to the value it had when editing started drops the entry.
    pub fn register_change(&mut self, mut change: PendingChange) {
        let key = change.key();
        if let Some(existing) = self.entries.get(&key) {
            change.original_value = existing.original_value.clone();
        }

        if change.is_noop() {
            if self.entries.remove(&key).is_some() {
                debug!("Change {} reverted to original", key);
            }
            return;
        }

        self.entries.insert(key, change);
    }

    pub fn clear_change(&mut self, content_id: &str, field: &str) {
        self.entries.remove(&ChangeKey::new(content_id, field));
    }

    pub fn has_changes(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, content_id: &str, field: &str) -> Option<&PendingChange> {
        self.entries.get(&ChangeKey::new(content_id, field))
    }

    pub fn changes_for(&self, content_id: &str) -> Vec<&PendingChange> {
        self.entries
            .values()
            .filter(|c| c.content_id == content_id)
            .collect()
    }

    /// One batch per content item, ordered by content id
    ///
    /// The model of a group is taken from its first entry.
    pub fn group_by_content(&self) -> Vec<ChangeBatch> {
        let mut groups: BTreeMap<&str, ChangeBatch> = BTreeMap::new();
        for change in self.entries.values() {
            groups
                .entry(change.content_id.as_str())
                .or_insert_with(|| ChangeBatch {
                    content_id: change.content_id.clone(),
                    model: change.model.clone(),
                    fields: BTreeMap::new(),
                })
                .fields
                .insert(change.field.clone(), change.value.clone());
        }
        groups.into_values().collect()
    }

    /// Save every group concurrently
    ///
    /// The pending map is cleared only when every group was stored; after a
    /// failure everything stays pending so the editor can retry.
    pub async fn save_all_changes<S>(&mut self, saver: &S) -> SaveOutcome
    where
        S: ChangeSaver + ?Sized,
    {
        if self.entries.is_empty() {
            return SaveOutcome::default();
        }

        let batches = self.group_by_content();
        let results = join_all(batches.iter().map(|batch| saver.save(batch))).await;

        let mut outcome = SaveOutcome::default();
        for (batch, result) in batches.iter().zip(results) {
            match result {
                Ok(()) => outcome.saved_batches += 1,
                Err(e) => {
                    warn!("Saving changes for {} failed: {}", batch.content_id, e);
                    outcome.failed.push((batch.content_id.clone(), e.to_string()));
                }
            }
        }

        if outcome.is_success() {
            info!(
                "Saved {} change(s) in {} request(s)",
                self.entries.len(),
                outcome.saved_batches
            );
            self.entries.clear();
        }
        outcome
    }

    pub fn discard_all_changes(&mut self) {
        if !self.entries.is_empty() {
            debug!("Discarding {} pending change(s)", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingChange> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    fn change(id: &str, field: &str, value: Value, original: Value) -> PendingChange {
        PendingChange {
            content_id: id.to_string(),
            model: "nieuws".to_string(),
            field: field.to_string(),
            value,
            original_value: original,
        }
    }

    #[derive(Default)]
    struct RecordingSaver {
        saved: Mutex<Vec<ChangeBatch>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl ChangeSaver for RecordingSaver {
        async fn save(&self, batch: &ChangeBatch) -> anyhow::Result<()> {
            if self.fail_for.as_deref() == Some(batch.content_id.as_str()) {
                anyhow::bail!("backend unavailable");
            }
            self.saved.lock().push(batch.clone());
            Ok(())
        }
    }

    #[test]
    fn test_register_same_as_original_is_ignored() {
        let mut pending = PendingChanges::new();
        pending.register_change(change("a1", "title", json!("X"), json!("X")));
        assert!(!pending.has_changes());
    }

    #[test]
    fn test_register_replaces_and_keeps_first_original() {
        let mut pending = PendingChanges::new();
        pending.register_change(change("a1", "title", json!("B"), json!("A")));
        pending.register_change(change("a1", "title", json!("C"), json!("B")));

        assert_eq!(pending.len(), 1);
        let entry = pending.get("a1", "title").unwrap();
        assert_eq!(entry.value, json!("C"));
        assert_eq!(entry.original_value, json!("A"));

        // back to the starting value drops the entry
        pending.register_change(change("a1", "title", json!("A"), json!("C")));
        assert!(!pending.has_changes());
    }

    #[test]
    fn test_clear_and_discard() {
        let mut pending = PendingChanges::new();
        pending.register_change(change("a1", "title", json!("B"), json!("A")));
        pending.register_change(change("a1", "summary", json!("s2"), json!("s1")));
        pending.clear_change("a1", "title");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.changes_for("a1").len(), 1);

        pending.discard_all_changes();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_group_by_content() {
        let mut pending = PendingChanges::new();
        pending.register_change(change("b2", "title", json!("T"), json!("t")));
        pending.register_change(change("a1", "title", json!("B"), json!("A")));
        pending.register_change(change("a1", "summary", json!("S"), json!("s")));

        let groups = pending.group_by_content();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].content_id, "a1");
        assert_eq!(groups[0].fields.len(), 2);
        assert_eq!(groups[0].fields["summary"], json!("S"));
        assert_eq!(groups[1].content_id, "b2");
    }

    #[tokio::test]
    async fn test_save_issues_one_request_per_content_item() {
        let mut pending = PendingChanges::new();
        pending.register_change(change("a1", "title", json!("B"), json!("A")));
        pending.register_change(change("a1", "summary", json!("S"), json!("s")));
        pending.register_change(change("b2", "title", json!("T"), json!("t")));

        let saver = RecordingSaver::default();
        let outcome = pending.save_all_changes(&saver).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.saved_batches, 2);
        assert_eq!(saver.saved.lock().len(), 2);
        assert!(!pending.has_changes());
    }

    #[tokio::test]
    async fn test_failed_group_keeps_everything_pending() {
        let mut pending = PendingChanges::new();
        pending.register_change(change("a1", "title", json!("B"), json!("A")));
        pending.register_change(change("b2", "title", json!("T"), json!("t")));

        let saver = RecordingSaver {
            fail_for: Some("b2".to_string()),
            ..Default::default()
        };
        let outcome = pending.save_all_changes(&saver).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "b2");
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn test_save_with_nothing_pending_is_noop() {
        let mut pending = PendingChanges::new();
        let saver = RecordingSaver::default();
        let outcome = pending.save_all_changes(&saver).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.saved_batches, 0);
        assert!(saver.saved.lock().is_empty());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ChangeKey::new("abc", "title").to_string(), "abc:title");
    }
}
