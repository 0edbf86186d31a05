// =============================================================================
// Rule Factory — maps a rule `type` string to a constructor
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Rule, RuleConfig};
use crate::errors::{PipelineError, Result};

type Constructor = Arc<dyn Fn(&RuleConfig) -> Result<Arc<dyn Rule>> + Send + Sync>;

/// Mapping `rule_type -> (RuleConfig -> Rule, error)` (spec.md §4.4).
/// Built-ins register themselves against this factory at startup through an
/// explicit registration call (spec.md §9) rather than any dynamic loading.
#[derive(Default)]
pub struct RuleFactory {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl RuleFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, rule_type: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&RuleConfig) -> Result<Arc<dyn Rule>> + Send + Sync + 'static,
    {
        let rule_type = rule_type.into();
        let mut guard = self.constructors.write();
        if guard.contains_key(&rule_type) {
            return Err(PipelineError::Duplicate(rule_type));
        }
        guard.insert(rule_type, Arc::new(constructor));
        Ok(())
    }

    pub fn build(&self, config: &RuleConfig) -> Result<Arc<dyn Rule>> {
        let guard = self.constructors.read();
        let constructor = guard
            .get(&config.rule_type)
            .ok_or_else(|| PipelineError::InvalidConfig(format!("no rule factory registered for type {}", config.rule_type)))?;
        constructor(config)
    }
}
