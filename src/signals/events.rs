// =============================================================================
// Inbound raw event schemas (spec.md §6)
// =============================================================================
//
// These mirror the shapes the gRPC transport decodes before handing off to
// the pipeline manager; the transport itself is out of scope (spec.md §1),
// so these structs exist purely as the typed boundary the signal processor
// consumes.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Fires on successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthTokenGenerated {
    pub user_id: String,
    pub namespace: String,
}

/// Fires on any tracked stat mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatItemUpdated {
    pub user_id: String,
    pub namespace: String,
    pub payload: StatPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatPayload {
    pub user_id: String,
    pub stat_code: String,
    pub latest_value: f64,
}
