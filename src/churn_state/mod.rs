// =============================================================================
// Churn State Store — durable per-player churn record
// =============================================================================
//
// `ChurnState` is the tree-shaped, back-reference-free durable record
// described in spec.md §3/§9: an append-only (subject to retention) signal
// history, an intervention history with an at-most-one-active-per-type
// invariant, and a monotonic cooldown. The store itself is polymorphic over
// {get, update} per spec.md §4.1; `memory` and `redis` below are the two
// concrete backends, selected at wiring time in `main.rs`.
// =============================================================================

pub mod memory;
pub mod redis_store;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::types::RetentionPolicy;

/// One entry in a player's signal history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalHistoryEntry {
    pub signal_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Lifecycle state of a dispatched intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionOutcome {
    Active,
    Completed,
    Failed,
    Expired,
}

impl std::fmt::Display for InterventionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A durable record of a single intervention (action firing) for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub id: String,
    /// Intervention type — one-to-one with the action type that created it
    /// (e.g. `"dispatch_comeback_challenge"`).
    #[serde(rename = "type")]
    pub intervention_type: String,
    /// The rule ID whose trigger caused this action to run.
    pub triggered_by: String,
    pub triggered_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub outcome: InterventionOutcome,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Per-user cooldown and counters. `cooldown_until` is monotonic
/// non-decreasing within a single update transaction (P2); intervention
/// counts are non-decreasing by construction (`increment_intervention_count`
/// is the only mutator and it always adds 1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cooldown {
    #[serde(default)]
    pub cooldown_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub intervention_counts: HashMap<String, u64>,
    #[serde(default)]
    pub last_signal_at: HashMap<String, DateTime<Utc>>,
}

impl Cooldown {
    /// Raise `cooldown_until` to `until`, never lowering it (P2).
    pub fn extend_until(&mut self, until: DateTime<Utc>) {
        self.cooldown_until = Some(match self.cooldown_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.cooldown_until, Some(until) if until > now)
    }

    pub fn increment_intervention_count(&mut self, intervention_type: &str) {
        *self.intervention_counts.entry(intervention_type.to_string()).or_insert(0) += 1;
    }

    pub fn record_signal(&mut self, signal_type: &str, at: DateTime<Utc>) {
        self.last_signal_at.insert(signal_type.to_string(), at);
    }
}

/// Durable per-player churn record. Owns no back-references; interventions
/// reference their triggering rule by ID string only (spec.md §9, "state
/// graph is a tree").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnState {
    #[serde(default)]
    pub signal_history: Vec<SignalHistoryEntry>,
    #[serde(default)]
    pub intervention_history: Vec<InterventionRecord>,
    #[serde(default)]
    pub cooldown: Cooldown,
}

impl ChurnState {
    /// Whether a record of `intervention_type` is currently `Active` (P1's
    /// invariant is upheld by checking this before `push_intervention`).
    pub fn has_active_intervention(&self, intervention_type: &str) -> bool {
        self.intervention_history
            .iter()
            .any(|r| r.intervention_type == intervention_type && r.outcome == InterventionOutcome::Active)
    }

    /// Most recent `Active` record of `intervention_type` whose
    /// `triggered_by` matches `rule_id`, if any — used by rollback to find
    /// the record it needs to flip to `Failed`.
    pub fn active_intervention_mut(
        &mut self,
        intervention_type: &str,
        rule_id: &str,
    ) -> Option<&mut InterventionRecord> {
        self.intervention_history
            .iter_mut()
            .rev()
            .find(|r| {
                r.intervention_type == intervention_type
                    && r.triggered_by == rule_id
                    && r.outcome == InterventionOutcome::Active
            })
    }

    pub fn push_signal(&mut self, entry: SignalHistoryEntry, retention: RetentionPolicy, now: DateTime<Utc>) {
        self.signal_history.push(entry);
        retention.trim(&mut self.signal_history, now, |e| e.timestamp);
    }

    /// Append an intervention record, enforcing P1 (at most one active per
    /// type) by construction: callers must have already checked
    /// `has_active_intervention` before calling this with an `Active` record.
    pub fn push_intervention(
        &mut self,
        record: InterventionRecord,
        retention: RetentionPolicy,
        now: DateTime<Utc>,
    ) {
        debug_assert!(
            record.outcome != InterventionOutcome::Active
                || !self.has_active_intervention(&record.intervention_type),
            "pushing a second active intervention of the same type violates P1"
        );
        self.intervention_history.push(record);
        retention.trim(&mut self.intervention_history, now, |r| r.triggered_at);
    }
}

/// Polymorphic over {get, update} per spec.md §4.1. `get_churn_state`
/// returns a zero-valued, well-initialized state when no record exists; it
/// never fails with "not found".
#[async_trait]
pub trait ChurnStateStore: Send + Sync {
    async fn get_churn_state(&self, namespace: &str, user_id: &str) -> Result<ChurnState>;
    async fn update_churn_state(&self, namespace: &str, user_id: &str, state: &ChurnState) -> Result<()>;
}

/// Build the backend key for a user's churn state: `<prefix>:<namespace>:<userID>`.
pub fn churn_state_key(prefix: &str, namespace: &str, user_id: &str) -> String {
    format!("{prefix}:{namespace}:{user_id}")
}

/// Decode a JSON payload into `ChurnState`, mapping failures to the typed,
/// non-masked `Decode` error per spec.md §7.
pub fn decode_churn_state(user_id: &str, payload: &[u8]) -> Result<ChurnState> {
    serde_json::from_slice(payload).map_err(|source| PipelineError::Decode {
        user_id: user_id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn at_most_one_active_per_type_is_detectable() {
        let mut state = ChurnState::default();
        assert!(!state.has_active_intervention("dispatch_comeback_challenge"));
        state.push_intervention(
            InterventionRecord {
                id: "i1".into(),
                intervention_type: "dispatch_comeback_challenge".into(),
                triggered_by: "rage_quit".into(),
                triggered_at: now(),
                expires_at: None,
                outcome: InterventionOutcome::Active,
                metadata: serde_json::Value::Null,
            },
            RetentionPolicy::default(),
            now(),
        );
        assert!(state.has_active_intervention("dispatch_comeback_challenge"));
    }

    #[test]
    fn cooldown_extend_until_is_monotonic() {
        let mut cooldown = Cooldown::default();
        let t1 = now();
        let t2 = t1 + Duration::hours(1);
        cooldown.extend_until(t2);
        cooldown.extend_until(t1);
        assert_eq!(cooldown.cooldown_until, Some(t2));
    }

    #[test]
    fn intervention_counts_are_non_decreasing() {
        let mut cooldown = Cooldown::default();
        cooldown.increment_intervention_count("dispatch_comeback_challenge");
        cooldown.increment_intervention_count("dispatch_comeback_challenge");
        assert_eq!(cooldown.intervention_counts["dispatch_comeback_challenge"], 2);
    }

    #[test]
    fn active_intervention_mut_finds_matching_rule() {
        let mut state = ChurnState::default();
        state.push_intervention(
            InterventionRecord {
                id: "i1".into(),
                intervention_type: "dispatch_comeback_challenge".into(),
                triggered_by: "rage_quit".into(),
                triggered_at: now(),
                expires_at: None,
                outcome: InterventionOutcome::Active,
                metadata: serde_json::Value::Null,
            },
            RetentionPolicy::default(),
            now(),
        );
        let found = state.active_intervention_mut("dispatch_comeback_challenge", "rage_quit");
        assert!(found.is_some());
        assert!(state
            .active_intervention_mut("dispatch_comeback_challenge", "losing_streak")
            .is_none());
    }

    #[test]
    fn decode_churn_state_reports_typed_error_on_corrupt_payload() {
        let err = decode_churn_state("u1", b"not json").unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
