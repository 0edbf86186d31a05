// =============================================================================
// Rule Engine, Rule Registry, and Rule Factory (spec.md §4.4)
// =============================================================================

pub mod builtins;
pub mod engine;
pub mod factory;
pub mod registry;

pub use engine::RuleEngine;
pub use factory::RuleFactory;
pub use registry::RuleRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::signals::{Signal, SignalType, Trigger};

/// Parsed, validated configuration for one rule instance — the same shape
/// the YAML loader produces (`src/config/mod.rs`) and built-ins read their
/// tunables from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub cooldown: Option<CooldownConfig>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    Global,
    PerUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    pub duration: String,
    pub scope: CooldownScope,
}

/// Rule capability set (spec.md §4.4): `{id, name, signal_types, evaluate,
/// config}`. Rules themselves enforce cooldown and active-intervention
/// uniqueness by inspecting `signal.context().state` — the engine does not
/// (see module docs on `engine`).
#[async_trait]
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn signal_types(&self) -> &[SignalType];
    async fn evaluate(&self, signal: &Signal) -> Result<Option<Trigger>>;
    fn config(&self) -> &RuleConfig;
}

/// Read a numeric parameter out of a rule's or action's free-form
/// `parameters` JSON blob, falling back to `default` when absent or of the
/// wrong shape.
pub fn param_f64(parameters: &serde_json::Value, key: &str, default: f64) -> f64 {
    parameters.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

pub fn param_u64(parameters: &serde_json::Value, key: &str, default: u64) -> u64 {
    parameters.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
}

pub fn param_str<'a>(parameters: &'a serde_json::Value, key: &str, default: &'a str) -> &'a str {
    parameters.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}
