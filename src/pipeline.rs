// =============================================================================
// Pipeline Manager (spec.md §4.6)
// =============================================================================
//
// Orchestrates Event -> Signal -> Rules -> Actions. Holds the immutable
// `ruleID -> ordered []actionID` map built once from config at startup.
// Rule-evaluation failures are loud (propagated); action failures are
// operationally routine and are logged, never re-raised — the method
// returns success as long as the engine itself didn't fail.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::actions::ActionExecutor;
use crate::errors::Result;
use crate::rules::RuleEngine;
use crate::signals::events::{OauthTokenGenerated, StatItemUpdated};
use crate::signals::processor::SignalProcessor;
use crate::user_mutex::UserMutexTable;

pub struct PipelineManager {
    signal_processor: Arc<SignalProcessor>,
    rule_engine: Arc<RuleEngine>,
    action_executor: Arc<ActionExecutor>,
    rule_actions: HashMap<String, Vec<String>>,
    user_mutex: Arc<UserMutexTable>,
}

impl PipelineManager {
    pub fn new(
        signal_processor: Arc<SignalProcessor>,
        rule_engine: Arc<RuleEngine>,
        action_executor: Arc<ActionExecutor>,
        rule_actions: HashMap<String, Vec<String>>,
        user_mutex: Arc<UserMutexTable>,
    ) -> Self {
        Self {
            signal_processor,
            rule_engine,
            action_executor,
            rule_actions,
            user_mutex,
        }
    }

    #[instrument(skip(self, event), fields(user_id = %event.user_id))]
    pub async fn process_oauth_event(&self, event: OauthTokenGenerated) -> Result<()> {
        let user_id = event.user_id.clone();
        let _guard = self.user_mutex.lock(&user_id).await;
        let Some(signal) = self.signal_processor.process_oauth_event(event).await? else {
            return Ok(());
        };
        self.run_pipeline(signal).await
    }

    #[instrument(skip(self, event), fields(user_id = %event.user_id, stat_code = %event.payload.stat_code))]
    pub async fn process_stat_event(&self, event: StatItemUpdated) -> Result<()> {
        let user_id = event.user_id.clone();
        let _guard = self.user_mutex.lock(&user_id).await;
        let Some(signal) = self.signal_processor.process_stat_event(event).await? else {
            return Ok(());
        };
        self.run_pipeline(signal).await
    }

    async fn run_pipeline(&self, signal: crate::signals::Signal) -> Result<()> {
        let triggers = self.rule_engine.evaluate(&signal).await?;
        if triggers.is_empty() {
            return Ok(());
        }

        let mut player_ctx = signal.into_context();
        for trigger in triggers {
            let Some(action_ids) = self.rule_actions.get(&trigger.rule_id) else {
                info!(rule_id = %trigger.rule_id, "trigger has no mapped actions, skipping");
                continue;
            };
            if action_ids.is_empty() {
                info!(rule_id = %trigger.rule_id, "trigger's action list is empty, skipping");
                continue;
            }

            let outcome = self
                .action_executor
                .execute_multiple(action_ids, &trigger, &mut player_ctx, true)
                .await;

            let failed = outcome.results.iter().filter(|r| !r.success).count();
            if let Some(err) = outcome.error {
                warn!(
                    rule_id = %trigger.rule_id,
                    failed,
                    total = outcome.results.len(),
                    error = %err,
                    "action chain had partial failures"
                );
            }
        }

        Ok(())
    }
}
