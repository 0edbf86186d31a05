// =============================================================================
// Built-in action: dispatch_comeback_challenge
// =============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::warn;

use crate::actions::{Action, ActionConfig};
use crate::churn_state::{ChurnStateStore, InterventionOutcome, InterventionRecord};
use crate::errors::{PipelineError, Result};
use crate::ports::UserStatisticUpdater;
use crate::rules::{param_str, param_u64};
use crate::signals::{PlayerContext, Trigger};
use crate::types::RetentionPolicy;

const DEFAULT_WINS_NEEDED: u64 = 3;
const DEFAULT_DURATION_DAYS: i64 = 7;
const DEFAULT_COOLDOWN_HOURS: i64 = 48;
const DEFAULT_INTERVENTION_TYPE: &str = "dispatch_comeback_challenge";

pub struct DispatchComebackChallengeAction {
    config: ActionConfig,
    wins_needed: u64,
    duration_days: i64,
    cooldown_hours: i64,
    intervention_type: String,
    churn_state_store: Arc<dyn ChurnStateStore>,
    stat_updater: Option<Arc<dyn UserStatisticUpdater>>,
}

impl DispatchComebackChallengeAction {
    pub fn from_config(
        config: &ActionConfig,
        churn_state_store: Arc<dyn ChurnStateStore>,
        stat_updater: Option<Arc<dyn UserStatisticUpdater>>,
    ) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            wins_needed: param_u64(&config.parameters, "wins_needed", DEFAULT_WINS_NEEDED),
            duration_days: param_u64(&config.parameters, "duration_days", DEFAULT_DURATION_DAYS as u64) as i64,
            cooldown_hours: param_u64(&config.parameters, "cooldown_hours", DEFAULT_COOLDOWN_HOURS as u64) as i64,
            intervention_type: param_str(&config.parameters, "intervention_type", DEFAULT_INTERVENTION_TYPE).to_string(),
            churn_state_store,
            stat_updater,
        })
    }
}

#[async_trait]
impl Action for DispatchComebackChallengeAction {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        "dispatch_comeback_challenge"
    }

    async fn execute(&self, trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<()> {
        let now = Utc::now();

        if let Some(cooldown_until) = player_ctx.state.cooldown.cooldown_until {
            if cooldown_until > now {
                return Err(PipelineError::OnCooldown {
                    action_id: self.config.id.clone(),
                    cooldown_until,
                });
            }
        }

        if player_ctx.state.has_active_intervention(&self.intervention_type) {
            // An intervention of this type is already active: no-op success
            // (spec.md §4.5 step b).
            return Ok(());
        }

        let record = InterventionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            intervention_type: self.intervention_type.clone(),
            triggered_by: trigger.rule_id.clone(),
            triggered_at: now,
            expires_at: Some(now + Duration::days(self.duration_days)),
            outcome: InterventionOutcome::Active,
            metadata: json!({ "wins_needed": self.wins_needed, "trigger_rule_id": trigger.rule_id }),
        };
        player_ctx.state.push_intervention(record, RetentionPolicy::default(), now);
        player_ctx.state.cooldown.extend_until(now + Duration::hours(self.cooldown_hours));
        player_ctx.state.cooldown.increment_intervention_count(&self.intervention_type);

        self.churn_state_store
            .update_churn_state(&player_ctx.namespace, &player_ctx.user_id, &player_ctx.state)
            .await?;

        if let Some(updater) = &self.stat_updater {
            if let Err(err) = updater.update_stat_comeback_challenge(&player_ctx.namespace, &player_ctx.user_id).await {
                warn!(error = %err, user_id = %player_ctx.user_id, "comeback-challenge stat nudge failed, continuing");
            }
        }

        Ok(())
    }

    async fn rollback(&self, trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<()> {
        let now = Utc::now();
        if let Some(record) = player_ctx
            .state
            .active_intervention_mut(&self.intervention_type, &trigger.rule_id)
        {
            record.outcome = InterventionOutcome::Failed;
        }
        player_ctx.state.cooldown.cooldown_until = None;

        self.churn_state_store
            .update_churn_state(&player_ctx.namespace, &player_ctx.user_id, &player_ctx.state)
            .await?;
        let _ = now;
        Ok(())
    }

    fn config(&self) -> &ActionConfig {
        &self.config
    }
}
