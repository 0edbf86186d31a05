// =============================================================================
// Built-in rule: losing_streak
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::rules::{param_str, param_u64, Rule, RuleConfig};
use crate::signals::{Signal, SignalType, Trigger};

const DEFAULT_THRESHOLD: u64 = 5;
const DEFAULT_INTERVENTION_TYPE: &str = "dispatch_comeback_challenge";

/// Matches `LosingStreak` signals. Emits when `streak >= threshold`, gated
/// by the same cooldown and active-intervention checks as `rage_quit`.
pub struct LosingStreakRule {
    config: RuleConfig,
    threshold: u64,
    intervention_type: String,
    signal_types: [SignalType; 1],
}

impl LosingStreakRule {
    pub fn from_config(config: &RuleConfig) -> Result<Self> {
        let threshold = param_u64(&config.parameters, "threshold", DEFAULT_THRESHOLD);
        let intervention_type = param_str(&config.parameters, "intervention_type", DEFAULT_INTERVENTION_TYPE).to_string();
        Ok(Self {
            config: config.clone(),
            threshold,
            intervention_type,
            signal_types: [SignalType::LosingStreak],
        })
    }
}

#[async_trait]
impl Rule for LosingStreakRule {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        "losing_streak"
    }

    fn signal_types(&self) -> &[SignalType] {
        &self.signal_types
    }

    async fn evaluate(&self, signal: &Signal) -> Result<Option<Trigger>> {
        let streak = signal.metadata()["streak"].as_f64().unwrap_or(0.0);
        if (streak as u64) < self.threshold {
            return Ok(None);
        }

        let state = &signal.context().state;
        let now = Utc::now();
        if state.cooldown.is_active(now) || state.has_active_intervention(&self.intervention_type) {
            return Ok(None);
        }

        Ok(Some(Trigger {
            rule_id: self.config.id.clone(),
            user_id: signal.user_id().to_string(),
            timestamp: now,
            reason: format!("losing streak {streak} reached threshold {}", self.threshold),
            metadata: json!({ "streak": streak, "threshold": self.threshold }),
            priority: self.config.priority,
        }))
    }

    fn config(&self) -> &RuleConfig {
        &self.config
    }
}
