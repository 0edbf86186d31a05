// =============================================================================
// Action Factory — maps an action `type` string to a constructor
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Action, ActionConfig};
use crate::errors::{PipelineError, Result};

type Constructor = Arc<dyn Fn(&ActionConfig) -> Result<Arc<dyn Action>> + Send + Sync>;

#[derive(Default)]
pub struct ActionFactory {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl ActionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, action_type: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&ActionConfig) -> Result<Arc<dyn Action>> + Send + Sync + 'static,
    {
        let action_type = action_type.into();
        let mut guard = self.constructors.write();
        if guard.contains_key(&action_type) {
            return Err(PipelineError::Duplicate(action_type));
        }
        guard.insert(action_type, Arc::new(constructor));
        Ok(())
    }

    pub fn build(&self, config: &ActionConfig) -> Result<Arc<dyn Action>> {
        let guard = self.constructors.read();
        let constructor = guard.get(&config.action_type).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("no action factory registered for type {}", config.action_type))
        })?;
        constructor(config)
    }
}
