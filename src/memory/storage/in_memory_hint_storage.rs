//! Process-local hint store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::blackboard::hint::{Hint, HintDraft};
use crate::blackboard::pattern::store_wildcard_matches;
use crate::memory::storage::interface::HintStore;
use crate::utilities::errors::StoreError;

/// Keeps hints in a vector in insertion order.
///
/// Expired hints are skipped by `query` and dropped by `purge_expired`.
#[derive(Debug, Default)]
pub struct InMemoryHintStore {
    hints: RwLock<Vec<Hint>>,
}

impl InMemoryHintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored hints, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.hints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.read().is_empty()
    }

    /// Drop expired hints. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut hints = self.hints.write();
        let before = hints.len();
        hints.retain(|h| !h.is_expired_at(now));
        before - hints.len()
    }

    pub fn clear(&self) {
        self.hints.write().clear();
    }
}

#[async_trait]
impl HintStore for InMemoryHintStore {
    async fn post(&self, hint: &HintDraft) -> Result<(), StoreError> {
        StoreError::check_key(&hint.key)?;
        let hint = hint.materialize(Utc::now());
        self.hints.write().push(hint);
        Ok(())
    }

    async fn query(&self, store_pattern: &str) -> Result<Vec<Hint>, StoreError> {
        let now = Utc::now();
        let hints = self.hints.read();
        Ok(hints
            .iter()
            .filter(|h| !h.is_expired_at(now) && store_wildcard_matches(store_pattern, &h.key))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::pattern::to_store_wildcard;
    use chrono::TimeDelta;
    use serde_json::json;

    #[tokio::test]
    async fn test_post_and_query_in_order() {
        let store = InMemoryHintStore::new();
        store.post(&HintDraft::new("aqe/test-queue/1", json!(1))).await.unwrap();
        store.post(&HintDraft::new("other/queue/1", json!(2))).await.unwrap();
        store.post(&HintDraft::new("aqe/test-queue/2", json!(3))).await.unwrap();

        let hits = store.query(&to_store_wildcard("aqe/test-queue/*")).await.unwrap();
        let keys: Vec<&str> = hits.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["aqe/test-queue/1", "aqe/test-queue/2"]);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_literal_percent_is_not_a_wildcard() {
        let store = InMemoryHintStore::new();
        store.post(&HintDraft::new("load/100%", json!(true))).await.unwrap();
        store.post(&HintDraft::new("load/1000", json!(false))).await.unwrap();

        let hits = store.query(&to_store_wildcard("load/100%")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "load/100%");
    }

    #[tokio::test]
    async fn test_expired_hints_are_hidden_then_purged() {
        let store = InMemoryHintStore::new();
        store.post(&HintDraft::new("fresh", json!(1)).with_ttl(3600)).await.unwrap();
        store.post(&HintDraft::new("stale", json!(2))).await.unwrap();
        {
            let mut hints = store.hints.write();
            hints[1].expires_at = Some(Utc::now() - TimeDelta::seconds(1));
        }

        let hits = store.query("%").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "fresh");

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }
}
