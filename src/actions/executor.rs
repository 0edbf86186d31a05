// =============================================================================
// Action Executor (spec.md §4.5)
// =============================================================================
//
// Ordering guarantee for one trigger: strictly sequential, first-listed
// first, no parallelism. `execute_multiple` is the only entry point that
// performs rollback; `execute` alone never rolls back its own failure.
// =============================================================================

use std::sync::Arc;

use tracing::{instrument, warn};

use super::{ActionRegistry, ActionResult};
use crate::errors::{PipelineError, Result};
use crate::signals::{PlayerContext, Trigger};

/// Result of `execute_multiple`: the accumulated per-action results plus,
/// if the chain aborted, the error that caused it. A present `error` is
/// never a `RollbackNotSupported` sentinel — that case is swallowed during
/// the rollback sweep itself.
#[derive(Debug)]
pub struct ExecuteMultipleOutcome {
    pub results: Vec<ActionResult>,
    pub error: Option<PipelineError>,
}

pub struct ActionExecutor {
    registry: Arc<ActionRegistry>,
}

impl ActionExecutor {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    /// Run a single action by ID, returning `ErrActionNotFound` if it isn't
    /// registered (or is disabled, which the registry treats as missing).
    #[instrument(skip(self, trigger, player_ctx), fields(action_id = action_id))]
    pub async fn execute(&self, action_id: &str, trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<ActionResult> {
        let action = self
            .registry
            .get(action_id)
            .ok_or_else(|| PipelineError::ActionNotFound(action_id.to_string()))?;

        match action.execute(trigger, player_ctx).await {
            Ok(()) => Ok(ActionResult::ok(action_id)),
            Err(err) => Ok(ActionResult::failed(action_id, err)),
        }
    }

    /// Run `action_ids` in order against `trigger`. On a missing action or a
    /// failed execution, if `rollback_on_error` is set, roll back the
    /// already-succeeded actions in reverse order (P9) before returning.
    #[instrument(skip(self, action_ids, trigger, player_ctx), fields(rule_id = %trigger.rule_id, action_count = action_ids.len()))]
    pub async fn execute_multiple(
        &self,
        action_ids: &[String],
        trigger: &Trigger,
        player_ctx: &mut PlayerContext,
        rollback_on_error: bool,
    ) -> ExecuteMultipleOutcome {
        let mut results: Vec<ActionResult> = Vec::with_capacity(action_ids.len());
        let mut succeeded: Vec<String> = Vec::new();
        let mut abort_error: Option<PipelineError> = None;

        for action_id in action_ids {
            let Some(action) = self.registry.get(action_id) else {
                abort_error = Some(PipelineError::ActionNotFound(action_id.clone()));
                break;
            };

            match action.execute(trigger, player_ctx).await {
                Ok(()) => {
                    results.push(ActionResult::ok(action_id.clone()));
                    succeeded.push(action_id.clone());
                }
                Err(err) => {
                    results.push(ActionResult::failed(action_id.clone(), &err));
                    abort_error = Some(err);
                    break;
                }
            }
        }

        if let Some(ref err) = abort_error {
            if rollback_on_error {
                self.rollback_reverse(&succeeded, trigger, player_ctx).await;
            }
            warn!(error = %err, succeeded = succeeded.len(), "action chain aborted");
        }

        ExecuteMultipleOutcome {
            results,
            error: abort_error,
        }
    }

    /// Roll back `action_ids` in reverse order. A `RollbackNotSupported`
    /// sentinel is expected and silent; any other rollback error is logged
    /// but never aborts the sweep (spec.md §4.5 step 4).
    async fn rollback_reverse(&self, action_ids: &[String], trigger: &Trigger, player_ctx: &mut PlayerContext) {
        for action_id in action_ids.iter().rev() {
            let Some(action) = self.registry.get(action_id) else {
                continue;
            };
            match action.rollback(trigger, player_ctx).await {
                Ok(()) => {}
                Err(err) if err.is_rollback_unsupported() => {}
                Err(err) => {
                    warn!(action_id, error = %err, "rollback failed, continuing sweep");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionConfig};
    use crate::churn_state::ChurnState;
    use crate::signals::PlayerContext;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct RecordingAction {
        config: ActionConfig,
        fail_on_execute: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Action for RecordingAction {
        fn id(&self) -> &str {
            &self.config.id
        }
        fn name(&self) -> &str {
            &self.config.id
        }
        async fn execute(&self, _t: &Trigger, _c: &mut PlayerContext) -> Result<()> {
            self.log.lock().push(format!("execute:{}", self.config.id));
            if self.fail_on_execute {
                return Err(PipelineError::BackendUnavailable("simulated".into()));
            }
            Ok(())
        }
        async fn rollback(&self, _t: &Trigger, _c: &mut PlayerContext) -> Result<()> {
            self.log.lock().push(format!("rollback:{}", self.config.id));
            Ok(())
        }
        fn config(&self) -> &ActionConfig {
            &self.config
        }
    }

    fn action(id: &str, fail: bool, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn Action> {
        Arc::new(RecordingAction {
            config: ActionConfig {
                id: id.to_string(),
                action_type: "stub".into(),
                enabled: true,
                r#async: false,
                retry: None,
                parameters: serde_json::Value::Null,
            },
            fail_on_execute: fail,
            log,
        })
    }

    fn trigger() -> Trigger {
        Trigger {
            rule_id: "r1".into(),
            user_id: "u1".into(),
            timestamp: Utc::now(),
            reason: "test".into(),
            metadata: serde_json::Value::Null,
            priority: 0,
        }
    }

    fn ctx() -> PlayerContext {
        PlayerContext::new("u1".into(), "ns".into(), ChurnState::default())
    }

    #[tokio::test]
    async fn reverse_order_rollback_on_third_action_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ActionRegistry::new());
        registry.register(action("a1", false, log.clone())).unwrap();
        registry.register(action("a2", false, log.clone())).unwrap();
        registry.register(action("a3", true, log.clone())).unwrap();

        let executor = ActionExecutor::new(registry);
        let ids = vec!["a1".to_string(), "a2".to_string(), "a3".to_string()];
        let mut player_ctx = ctx();
        let outcome = executor.execute_multiple(&ids, &trigger(), &mut player_ctx, true).await;

        assert!(outcome.error.is_some());
        assert_eq!(outcome.results.len(), 3);
        assert!(!outcome.results[2].success);

        let entries = log.lock().clone();
        assert_eq!(
            entries,
            vec!["execute:a1", "execute:a2", "execute:a3", "rollback:a2", "rollback:a1"]
        );
    }

    #[tokio::test]
    async fn missing_action_aborts_and_rolls_back_executed_peers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ActionRegistry::new());
        registry.register(action("a1", false, log.clone())).unwrap();

        let executor = ActionExecutor::new(registry);
        let ids = vec!["a1".to_string(), "missing".to_string()];
        let mut player_ctx = ctx();
        let outcome = executor.execute_multiple(&ids, &trigger(), &mut player_ctx, true).await;

        assert!(matches!(outcome.error, Some(PipelineError::ActionNotFound(_))));
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(log.lock().clone(), vec!["execute:a1", "rollback:a1"]);
    }

    #[tokio::test]
    async fn all_actions_succeed_with_no_rollback() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ActionRegistry::new());
        registry.register(action("a1", false, log.clone())).unwrap();
        registry.register(action("a2", false, log.clone())).unwrap();

        let executor = ActionExecutor::new(registry);
        let ids = vec!["a1".to_string(), "a2".to_string()];
        let mut player_ctx = ctx();
        let outcome = executor.execute_multiple(&ids, &trigger(), &mut player_ctx, true).await;

        assert!(outcome.error.is_none());
        assert!(outcome.results.iter().all(|r| r.success));
        assert_eq!(log.lock().clone(), vec!["execute:a1", "execute:a2"]);
    }
}
