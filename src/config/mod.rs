// =============================================================================
// Configuration Loader and Wiring Validator (spec.md §4.7)
// =============================================================================

pub mod wiring;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::ActionConfig;
use crate::errors::{PipelineError, Result};
use crate::rules::RuleConfig;

/// The config schema (spec.md §4.7): a list of `rules` and a list of
/// `actions`. Values in strings support `${VAR}` / `${VAR:default}`
/// substitution against the process environment, expanded before parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

impl PipelineConfig {
    /// Structural validation (spec.md §4.7):
    /// - no empty IDs or types;
    /// - no duplicate IDs within rules, nor within actions;
    /// - every action-ID referenced in any rule's `actions` list exists in
    ///   the actions section.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let mut rule_ids = HashSet::new();
        for rule in &self.rules {
            if rule.id.is_empty() {
                errors.push("a rule has an empty id".to_string());
            }
            if rule.rule_type.is_empty() {
                errors.push(format!("rule {} has an empty type", rule.id));
            }
            if !rule_ids.insert(rule.id.clone()) {
                errors.push(format!("duplicate rule id {}", rule.id));
            }
        }

        let mut action_ids = HashSet::new();
        for action in &self.actions {
            if action.id.is_empty() {
                errors.push("an action has an empty id".to_string());
            }
            if action.action_type.is_empty() {
                errors.push(format!("action {} has an empty type", action.id));
            }
            if !action_ids.insert(action.id.clone()) {
                errors.push(format!("duplicate action id {}", action.id));
            }
        }

        for rule in &self.rules {
            for action_id in &rule.actions {
                if !action_ids.contains(action_id) {
                    errors.push(format!("rule {} references unknown action id {}", rule.id, action_id));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::InvalidConfig(errors.join("; ")))
        }
    }

    /// The immutable `ruleID -> ordered []actionID` map the pipeline manager
    /// holds, derived directly from each rule's `actions` list.
    pub fn rule_actions_map(&self) -> std::collections::HashMap<String, Vec<String>> {
        self.rules.iter().map(|r| (r.id.clone(), r.actions.clone())).collect()
    }
}

/// Read `path`, expand environment variables, parse as YAML, and run
/// structural validation.
pub async fn load_from_file(path: &Path) -> Result<PipelineConfig> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::InvalidConfig(format!("failed to read config file {}: {e}", path.display())))?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<PipelineConfig> {
    let expanded = expand_env_vars(yaml);
    let config: PipelineConfig =
        serde_yaml::from_str(&expanded).map_err(|e| PipelineError::InvalidConfig(format!("failed to parse config: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Expand `${VAR}` and `${VAR:default}` references against the process
/// environment. A reference to an unset variable with no default expands to
/// the empty string, matching typical shell `${VAR:-}` semantics rather than
/// failing the load — validation catches the resulting empty IDs/types.
fn expand_env_vars(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(dollar_brace) = rest.find("${") {
        output.push_str(&rest[..dollar_brace]);
        let after = &rest[dollar_brace + 2..];
        match after.find('}') {
            Some(close) => {
                let inner = &after[..close];
                let (var_name, default) = match inner.split_once(':') {
                    Some((name, default)) => (name, Some(default)),
                    None => (inner, None),
                };
                let value = std::env::var(var_name).ok().or_else(|| default.map(str::to_string)).unwrap_or_default();
                output.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                output.push_str("${");
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}
