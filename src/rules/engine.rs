// =============================================================================
// Rule Engine (spec.md §4.4)
// =============================================================================
//
// The engine does not itself enforce cooldowns or active-intervention
// uniqueness — rules do, by inspecting `signal.context().state`. Some rules
// may intentionally fire during cooldown (e.g. logging-only rules), so that
// gating stays a per-rule decision.
// =============================================================================

use std::sync::Arc;

use tracing::{instrument, warn};

use super::RuleRegistry;
use crate::errors::Result;
use crate::signals::{Signal, Trigger};

pub struct RuleEngine {
    registry: Arc<RuleRegistry>,
}

impl RuleEngine {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    /// Evaluate `signal` against every enabled, matching rule, highest
    /// `priority` first, ties broken by registration order (P8). A rule
    /// whose `evaluate` errors is logged and skipped; others still run.
    #[instrument(skip(self, signal), fields(signal_type = %signal.kind(), user_id = signal.user_id()))]
    pub async fn evaluate(&self, signal: &Signal) -> Result<Vec<Trigger>> {
        let mut rules = self.registry.get_by_signal_type(signal.kind());
        rules.retain(|r| r.config().enabled);
        rules.sort_by(|a, b| b.config().priority.cmp(&a.config().priority));

        let mut triggers = Vec::new();
        for rule in rules {
            match rule.evaluate(signal).await {
                Ok(Some(trigger)) => triggers.push(trigger),
                Ok(None) => {}
                Err(err) => {
                    warn!(rule_id = rule.id(), error = %err, "rule evaluation failed, skipping");
                }
            }
        }
        Ok(triggers)
    }
}
