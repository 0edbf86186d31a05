// =============================================================================
// Built-in rule: session_decline
// =============================================================================
//
// Resolved open question (spec.md §9, scenario 4): fires when the player has
// at least one tracked prior week with `count > 0` and the just-incremented
// current week's count is exactly `1` — i.e. this is the first login of the
// current ISO week, evaluated strictly post-increment. `weeks_with_activity`
// and `this_week` are both computed by `OauthLoginProcessor` and carried on
// the signal's metadata, so this rule only needs to read them.
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::rules::{param_str, Rule, RuleConfig};
use crate::signals::{Signal, SignalType, Trigger};

const DEFAULT_INTERVENTION_TYPE: &str = "dispatch_comeback_challenge";

pub struct SessionDeclineRule {
    config: RuleConfig,
    intervention_type: String,
    signal_types: [SignalType; 1],
}

impl SessionDeclineRule {
    pub fn from_config(config: &RuleConfig) -> Result<Self> {
        let intervention_type = param_str(&config.parameters, "intervention_type", DEFAULT_INTERVENTION_TYPE).to_string();
        Ok(Self {
            config: config.clone(),
            intervention_type,
            signal_types: [SignalType::Login],
        })
    }
}

#[async_trait]
impl Rule for SessionDeclineRule {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        "session_decline"
    }

    fn signal_types(&self) -> &[SignalType] {
        &self.signal_types
    }

    async fn evaluate(&self, signal: &Signal) -> Result<Option<Trigger>> {
        let this_week = signal.metadata()["this_week"].as_u64().unwrap_or(0);
        let weeks_with_activity = signal.metadata()["weeks_with_activity"].as_u64().unwrap_or(0);

        if weeks_with_activity == 0 || this_week != 1 {
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
            reason: "first login of the week after a gap in activity".into(),
            metadata: json!({ "this_week": this_week, "weeks_with_activity": weeks_with_activity }),
            priority: self.config.priority,
        }))
    }

    fn config(&self) -> &RuleConfig {
        &self.config
    }
}
