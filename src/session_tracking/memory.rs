// =============================================================================
// In-memory Login Session Tracking Store — test/single-process fallback
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::LoginSessionTrackingStore;
use crate::errors::Result;

#[derive(Default)]
pub struct InMemorySessionTrackingStore {
    // userID -> (weekKey -> count)
    weeks: RwLock<HashMap<String, HashMap<String, u64>>>,
}

impl InMemorySessionTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginSessionTrackingStore for InMemorySessionTrackingStore {
    async fn increment_week(&self, user_id: &str, week_key: &str) -> Result<u64> {
        let mut guard = self.weeks.write();
        let user_weeks = guard.entry(user_id.to_string()).or_default();
        let count = user_weeks.entry(week_key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn get_week(&self, user_id: &str, week_key: &str) -> Result<u64> {
        Ok(self
            .weeks
            .read()
            .get(user_id)
            .and_then(|weeks| weeks.get(week_key))
            .copied()
            .unwrap_or(0))
    }

    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, u64>> {
        Ok(self.weeks.read().get(user_id).cloned().unwrap_or_default())
    }

    async fn prune_older_than(&self, user_id: &str, week_key: &str) -> Result<()> {
        if let Some(user_weeks) = self.weeks.write().get_mut(user_id) {
            user_weeks.retain(|k, _| k.as_str() >= week_key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_week_is_atomic_and_returns_new_count() {
        let store = InMemorySessionTrackingStore::new();
        assert_eq!(store.increment_week("u1", "202612").await.unwrap(), 1);
        assert_eq!(store.increment_week("u1", "202612").await.unwrap(), 2);
        assert_eq!(store.get_week("u1", "202612").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn distinct_weeks_touch_distinct_buckets() {
        let store = InMemorySessionTrackingStore::new();
        store.increment_week("u1", "202611").await.unwrap();
        store.increment_week("u1", "202612").await.unwrap();
        let all = store.get_all("u1").await.unwrap();
        assert_eq!(all.get("202611"), Some(&1));
        assert_eq!(all.get("202612"), Some(&1));
    }

    #[tokio::test]
    async fn prune_older_than_drops_keys_lexicographically_before() {
        let store = InMemorySessionTrackingStore::new();
        store.increment_week("u1", "202609").await.unwrap();
        store.increment_week("u1", "202610").await.unwrap();
        store.increment_week("u1", "202612").await.unwrap();
        store.prune_older_than("u1", "202611").await.unwrap();
        let all = store.get_all("u1").await.unwrap();
        assert!(!all.contains_key("202609"));
        assert!(!all.contains_key("202610"));
        assert!(all.contains_key("202612"));
    }

    #[tokio::test]
    async fn prune_is_idempotent_on_already_empty_user() {
        let store = InMemorySessionTrackingStore::new();
        store.prune_older_than("nobody", "202612").await.unwrap();
    }
}
