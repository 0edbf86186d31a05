// =============================================================================
// In-memory Churn State Store — test/single-process fallback backend
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ChurnState, ChurnStateStore};
use crate::churn_state::churn_state_key;
use crate::errors::Result;

/// An in-process `ChurnStateStore`. Has no TTL semantics (nothing expires);
/// suitable for tests and for single-instance deployments that don't need a
/// durable backend across restarts.
#[derive(Default)]
pub struct InMemoryChurnStateStore {
    records: RwLock<HashMap<String, ChurnState>>,
}

impl InMemoryChurnStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChurnStateStore for InMemoryChurnStateStore {
    async fn get_churn_state(&self, namespace: &str, user_id: &str) -> Result<ChurnState> {
        let key = churn_state_key("churn", namespace, user_id);
        Ok(self.records.read().get(&key).cloned().unwrap_or_default())
    }

    async fn update_churn_state(&self, namespace: &str, user_id: &str, state: &ChurnState) -> Result<()> {
        let key = churn_state_key("churn", namespace, user_id);
        self.records.write().insert(key, state.clone());
        Ok(())
    }
}
