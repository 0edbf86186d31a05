// =============================================================================
// Login Session Tracking Store — per-user ISO-week login counters
// =============================================================================
//
// A durable `isoWeekKey ("YYYYWW") -> loginCount` map per user (spec.md §4.2).
// `increment_week` MUST be atomic at the backend (P7): the Redis backend uses
// `HINCRBY`, a single round trip with no read-modify-write race; the
// in-memory backend holds the per-user map behind a single lock, giving the
// same atomicity for free.
// =============================================================================

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::Result;

/// Polymorphic over {`increment_week`, `get_week`, `get_all`,
/// `prune_older_than`} per spec.md §4.2. Pruning is best-effort and
/// idempotent — callers MUST NOT treat a missing key as an error.
#[async_trait]
pub trait LoginSessionTrackingStore: Send + Sync {
    /// Atomically increment `week_key`'s counter and return the new count.
    async fn increment_week(&self, user_id: &str, week_key: &str) -> Result<u64>;

    async fn get_week(&self, user_id: &str, week_key: &str) -> Result<u64>;

    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, u64>>;

    /// Remove any week bucket that sorts strictly before `week_key`.
    /// Best-effort: a backend error here is logged, never propagated as a
    /// pipeline failure.
    async fn prune_older_than(&self, user_id: &str, week_key: &str) -> Result<()>;
}

/// Build the backend key for a user's session-tracking hash:
/// `session_tracking:<userID>` (spec.md §6).
pub fn session_tracking_key(user_id: &str) -> String {
    format!("session_tracking:{user_id}")
}

/// Number of trailing weeks retained before `prune_older_than` drops a
/// bucket: "current and up to three prior weeks" per spec.md §4.2.
pub const RETAINED_WEEKS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tracking_key_is_namespaced() {
        assert_eq!(session_tracking_key("u1"), "session_tracking:u1");
    }
}
