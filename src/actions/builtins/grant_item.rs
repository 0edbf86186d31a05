// =============================================================================
// Built-in action: grant_item
// =============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::actions::{Action, ActionConfig};
use crate::errors::{PipelineError, Result};
use crate::ports::EntitlementGranter;
use crate::rules::param_u64;
use crate::signals::{PlayerContext, Trigger};

const DEFAULT_QUANTITY: u64 = 1;

pub struct GrantItemAction {
    config: ActionConfig,
    item_id: String,
    quantity: u32,
    granter: Option<Arc<dyn EntitlementGranter>>,
}

impl GrantItemAction {
    pub fn from_config(config: &ActionConfig, granter: Option<Arc<dyn EntitlementGranter>>) -> Result<Self> {
        let item_id = config.parameters.get("item_id").and_then(|v| v.as_str()).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("grant_item action {} is missing required parameter item_id", config.id))
        })?;
        Ok(Self {
            config: config.clone(),
            item_id: item_id.to_string(),
            quantity: param_u64(&config.parameters, "quantity", DEFAULT_QUANTITY) as u32,
            granter,
        })
    }
}

#[async_trait]
impl Action for GrantItemAction {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        "grant_item"
    }

    async fn execute(&self, _trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<()> {
        match &self.granter {
            Some(granter) => granter
                .grant_entitlement(&player_ctx.namespace, &player_ctx.user_id, &self.item_id, self.quantity)
                .await
                .map_err(|e| PipelineError::BackendUnavailable(e.to_string())),
            None => {
                debug!(
                    user_id = %player_ctx.user_id,
                    item_id = %self.item_id,
                    "no entitlement granter configured (test mode) — logging grant and succeeding"
                );
                Ok(())
            }
        }
    }

    async fn rollback(&self, _trigger: &Trigger, _player_ctx: &mut PlayerContext) -> Result<()> {
        Err(PipelineError::RollbackNotSupported(self.config.id.clone()))
    }

    fn config(&self) -> &ActionConfig {
        &self.config
    }
}
