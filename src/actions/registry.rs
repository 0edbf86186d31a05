// =============================================================================
// Action Registry — insertion-ordered, register-once, thread-safe for reads
// =============================================================================
//
// Disabled actions are invisible to the executor (spec.md §4.5) — `get`
// filters on `config().enabled` so a disabled registration is treated
// exactly like a missing one.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Action;
use crate::errors::{PipelineError, Result};

#[derive(Default)]
pub struct ActionRegistry {
    order: RwLock<Vec<String>>,
    actions: RwLock<HashMap<String, Arc<dyn Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action`. Re-registering an existing `id()` fails with
    /// `ErrDuplicate`, leaving the first entry intact (P4).
    pub fn register(&self, action: Arc<dyn Action>) -> Result<()> {
        let id = action.id().to_string();
        let mut actions = self.actions.write();
        if actions.contains_key(&id) {
            return Err(PipelineError::Duplicate(id));
        }
        self.order.write().push(id.clone());
        actions.insert(id, action);
        Ok(())
    }

    /// The registered, enabled action for `id`, or `None` if absent or
    /// disabled.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Action>> {
        self.actions
            .read()
            .get(id)
            .filter(|a| a.config().enabled)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.read().contains_key(id)
    }
}
