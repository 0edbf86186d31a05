// =============================================================================
// Wiring Validator (spec.md §4.7, P6)
// =============================================================================
//
// Runs after registries are populated: every enabled rule/action ID in
// config must have a corresponding registered instance. Startup aborts with
// a composite error listing every missing item, not just the first, so an
// operator fixes every typo in one pass.
// =============================================================================

use crate::actions::ActionRegistry;
use crate::errors::{PipelineError, Result};
use crate::rules::RuleRegistry;

use super::PipelineConfig;

pub fn validate_wiring(config: &PipelineConfig, rule_registry: &RuleRegistry, action_registry: &ActionRegistry) -> Result<()> {
    let mut missing = Vec::new();

    for rule in &config.rules {
        if rule.enabled && !rule_registry.contains(&rule.id) {
            missing.push(format!("rule {} (type {}) is enabled in config but not registered", rule.id, rule.rule_type));
        }
    }

    for action in &config.actions {
        if action.enabled && !action_registry.contains(&action.id) {
            missing.push(format!(
                "action {} (type {}) is enabled in config but not registered",
                action.id, action.action_type
            ));
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(missing.join("; ")))
    }
}
