// =============================================================================
// Built-in action: send_email_notification_after_granting_item
// =============================================================================
//
// A no-op stub (spec.md §4.5) — delivering real email is an explicit
// non-goal (spec.md §1). Exists so config can wire a third step onto the
// `grant_item` chain and see it logged.
// =============================================================================

use async_trait::async_trait;
use tracing::info;

use crate::actions::{Action, ActionConfig};
use crate::errors::{PipelineError, Result};
use crate::signals::{PlayerContext, Trigger};

pub struct SendEmailNotificationAction {
    config: ActionConfig,
}

impl SendEmailNotificationAction {
    pub fn from_config(config: &ActionConfig) -> Result<Self> {
        Ok(Self { config: config.clone() })
    }
}

#[async_trait]
impl Action for SendEmailNotificationAction {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        "send_email_notification_after_granting_item"
    }

    async fn execute(&self, _trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<()> {
        info!(user_id = %player_ctx.user_id, "email notification stub — always succeeds, no email sent");
        Ok(())
    }

    async fn rollback(&self, _trigger: &Trigger, _player_ctx: &mut PlayerContext) -> Result<()> {
        Err(PipelineError::RollbackNotSupported(self.config.id.clone()))
    }

    fn config(&self) -> &ActionConfig {
        &self.config
    }
}
