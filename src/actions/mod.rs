// =============================================================================
// Action Executor, Action Registry, and Action Factory (spec.md §4.5)
// =============================================================================

pub mod builtins;
pub mod executor;
pub mod factory;
pub mod registry;

pub use executor::{ActionExecutor, ExecuteMultipleOutcome};
pub use factory::ActionFactory;
pub use registry::ActionRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::signals::{PlayerContext, Trigger};

/// Parsed, validated configuration for one action instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub r#async: bool,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    1
}

/// Outcome of one `Action::execute` or `Action::rollback` call, as returned
/// from `ActionExecutor::execute` (spec.md §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub action_id: String,
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ActionResult {
    pub fn ok(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: true,
            error: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn failed(action_id: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            action_id: action_id.into(),
            success: false,
            error: Some(error.to_string()),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Action capability set (spec.md §4.5): `{id, name, execute, rollback,
/// config}`. `rollback` may return the sentinel
/// `PipelineError::RollbackNotSupported`.
#[async_trait]
pub trait Action: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    async fn execute(&self, trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<()>;
    async fn rollback(&self, trigger: &Trigger, player_ctx: &mut PlayerContext) -> Result<()>;
    fn config(&self) -> &ActionConfig;
}
