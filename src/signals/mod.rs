// =============================================================================
// Signals — typed, enriched occurrences derived from raw platform events
// =============================================================================
//
// `Signal` is the capability set from spec.md §3: immutable after
// construction, carrying a type, the originating user, a timestamp,
// free-form metadata, and the enriched `PlayerContext` the rule engine and
// action executor operate against. Rust has no interfaces, so the capability
// set is a concrete struct with an enum discriminant (`SignalType`) rather
// than a trait object — the same choice the teacher makes for its own
// tagged-variant types (`DecisionEnvelope` in `decision_envelope.rs`).
// =============================================================================

pub mod builtins;
pub mod events;
pub mod processor;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::churn_state::ChurnState;
use crate::types::{Namespace, UserId};

/// Discriminant for `Signal::kind`. Spec.md §3 lists these as the minimum
/// variant set; new variants are added alongside new built-in processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Login,
    Logout,
    Win,
    Loss,
    RageQuit,
    LosingStreak,
    SessionDecline,
    StatUpdate,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Win => "win",
            Self::Loss => "loss",
            Self::RageQuit => "rage_quit",
            Self::LosingStreak => "losing_streak",
            Self::SessionDecline => "session_decline",
            Self::StatUpdate => "stat_update",
        };
        write!(f, "{s}")
    }
}

/// Transient per-signal envelope (spec.md §3). Created by the signal
/// processor when enriching a signal, mutated by actions, persisted by
/// whichever action last mutates `state`. Never shared across signals — each
/// `PipelineManager::process_*_event` call builds and consumes exactly one.
#[derive(Debug, Clone)]
pub struct PlayerContext {
    pub user_id: UserId,
    pub namespace: Namespace,
    pub state: ChurnState,
}

impl PlayerContext {
    pub fn new(user_id: UserId, namespace: Namespace, state: ChurnState) -> Self {
        Self { user_id, namespace, state }
    }
}

/// A normalized, typed occurrence in a player's behavior (spec.md §3).
/// Immutable after construction; the engine and rules read it by shared
/// reference, never mutate it.
#[derive(Debug, Clone)]
pub struct Signal {
    kind: SignalType,
    user_id: UserId,
    timestamp: DateTime<Utc>,
    metadata: serde_json::Value,
    context: PlayerContext,
}

impl Signal {
    pub fn new(
        kind: SignalType,
        user_id: impl Into<UserId>,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
        context: PlayerContext,
    ) -> Self {
        Self {
            kind,
            user_id: user_id.into(),
            timestamp,
            metadata,
            context,
        }
    }

    pub fn kind(&self) -> SignalType {
        self.kind
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn context(&self) -> &PlayerContext {
        &self.context
    }

    /// Consume the signal, yielding its `PlayerContext` for the action
    /// executor to mutate and persist across the trigger chain.
    pub fn into_context(self) -> PlayerContext {
        self.context
    }
}

/// Immutable value emitted by a matched rule (spec.md §3). Carries no direct
/// reference to actions — the pipeline manager resolves `rule_id -> action
/// chain` separately, keeping the rule/action graphs decoupled.
#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    pub rule_id: String,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub metadata: serde_json::Value,
    /// Higher fires earlier among triggers from the same signal (P8).
    pub priority: i32,
}
