// =============================================================================
// Built-in rule: rage_quit
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::rules::{param_str, param_u64, Rule, RuleConfig};
use crate::signals::{Signal, SignalType, Trigger};

const DEFAULT_THRESHOLD: u64 = 3;
const DEFAULT_INTERVENTION_TYPE: &str = "dispatch_comeback_challenge";

/// Matches `RageQuit` signals. Emits a trigger when `quit_count >=
/// threshold`, no active intervention of the configured type exists, and
/// the player is not on cooldown (spec.md §4.4).
pub struct RageQuitRule {
    config: RuleConfig,
    threshold: u64,
    intervention_type: String,
    signal_types: [SignalType; 1],
}

impl RageQuitRule {
    pub fn from_config(config: &RuleConfig) -> Result<Self> {
        let threshold = param_u64(&config.parameters, "threshold", DEFAULT_THRESHOLD);
        let intervention_type = param_str(&config.parameters, "intervention_type", DEFAULT_INTERVENTION_TYPE).to_string();
        Ok(Self {
            config: config.clone(),
            threshold,
            intervention_type,
            signal_types: [SignalType::RageQuit],
        })
    }
}

#[async_trait]
impl Rule for RageQuitRule {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        "rage_quit"
    }

    fn signal_types(&self) -> &[SignalType] {
        &self.signal_types
    }

    async fn evaluate(&self, signal: &Signal) -> Result<Option<Trigger>> {
        let quit_count = signal.metadata()["quit_count"].as_f64().unwrap_or(0.0);
        if (quit_count as u64) < self.threshold {
            return Ok(None);
        }

        let state = &signal.context().state;
        let now = Utc::now();
        if state.cooldown.is_active(now) {
            return Ok(None);
        }
        if state.has_active_intervention(&self.intervention_type) {
            return Ok(None);
        }

        Ok(Some(Trigger {
            rule_id: self.config.id.clone(),
            user_id: signal.user_id().to_string(),
            timestamp: now,
            reason: format!("quit_count {quit_count} reached threshold {}", self.threshold),
            metadata: json!({ "quit_count": quit_count, "threshold": self.threshold }),
            priority: self.config.priority,
        }))
    }

    fn config(&self) -> &RuleConfig {
        &self.config
    }
}
