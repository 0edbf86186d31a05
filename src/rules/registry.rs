// =============================================================================
// Rule Registry — insertion-ordered, register-once, thread-safe for reads
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Rule;
use crate::errors::{PipelineError, Result};
use crate::signals::SignalType;

#[derive(Default)]
pub struct RuleRegistry {
    order: RwLock<Vec<String>>,
    rules: RwLock<HashMap<String, Arc<dyn Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule`. Re-registering an existing `id()` fails with
    /// `ErrDuplicate`, leaving the first entry intact (P4).
    pub fn register(&self, rule: Arc<dyn Rule>) -> Result<()> {
        let id = rule.id().to_string();
        let mut rules = self.rules.write();
        if rules.contains_key(&id) {
            return Err(PipelineError::Duplicate(id));
        }
        self.order.write().push(id.clone());
        rules.insert(id, rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.rules.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.read().contains_key(id)
    }

    /// All registered rules declaring `signal_type`, in insertion order.
    pub fn get_by_signal_type(&self, signal_type: SignalType) -> Vec<Arc<dyn Rule>> {
        let order = self.order.read();
        let rules = self.rules.read();
        order
            .iter()
            .filter_map(|id| rules.get(id))
            .filter(|r| r.signal_types().contains(&signal_type))
            .cloned()
            .collect()
    }
}
