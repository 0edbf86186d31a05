// =============================================================================
// Error Taxonomy — typed errors for the signal/rule/action pipeline
// =============================================================================
//
// `anyhow` is used at the process boundary (config loading, bootstrap) the
// same way the teacher's `runtime_config.rs` uses it. Inside the pipeline,
// callers need to match on specific failure kinds (a rollback sweep must
// distinguish "rollback not supported" from a real failure; the wiring
// validator must report every missing registration, not just the first) so
// those paths use this typed enum instead.
// =============================================================================

use thiserror::Error;

/// Errors surfaced by the signal/rule/action pipeline and its registries.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An action received a `None` `PlayerContext` — a caller/wiring bug.
    #[error("missing player context for action {action_id}")]
    MissingPlayerContext { action_id: String },

    /// A state or session-tracking backend is transiently unreachable.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Persisted state for a user could not be decoded. Fatal for that user;
    /// never silently overwritten.
    #[error("failed to decode persisted state for user {user_id}: {source}")]
    Decode {
        user_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A registry already has an entry under this ID.
    #[error("duplicate registration for id {0}")]
    Duplicate(String),

    /// `ExecuteMultiple` was asked to run an action ID with no registered
    /// (and enabled) entry.
    #[error("action not found: {0}")]
    ActionNotFound(String),

    /// Configuration failed structural validation or wiring validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sentinel: not a failure. An action's `Rollback` declined to support
    /// reversal; the rollback sweep logs this and continues.
    #[error("rollback not supported for action {0}")]
    RollbackNotSupported(String),

    /// `dispatch_comeback_challenge`'s fail-fast cooldown gate (spec.md
    /// §4.5 step a). Not in the source taxonomy (§7); added so the action
    /// chain aborts (and rolls back peers) the same way any other action
    /// failure does, instead of silently no-op'ing like the
    /// active-intervention gate in step (b).
    #[error("action {action_id} is on cooldown until {cooldown_until}")]
    OnCooldown {
        action_id: String,
        cooldown_until: chrono::DateTime<chrono::Utc>,
    },
}

impl PipelineError {
    /// `true` for the rollback-not-supported sentinel, which callers must
    /// treat as "continue the sweep", not as a sweep-aborting failure.
    pub fn is_rollback_unsupported(&self) -> bool {
        matches!(self, PipelineError::RollbackNotSupported(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
