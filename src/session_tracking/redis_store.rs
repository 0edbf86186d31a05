// =============================================================================
// Redis-backed Login Session Tracking Store
// =============================================================================
//
// One hash per user keyed `session_tracking:<userID>`, fields are ISO-week
// strings, values are integer counts (spec.md §6). `HINCRBY` gives the
// atomic increment P7 requires in a single round trip; TTL is refreshed on
// every increment.
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use tracing::{instrument, warn};

use super::{session_tracking_key, LoginSessionTrackingStore};
use crate::errors::{PipelineError, Result};

/// TTL refreshed on every increment, per spec.md §6 (30 days).
const SESSION_TRACKING_TTL_SECONDS: i64 = 30 * 24 * 3600;

pub struct RedisSessionTrackingStore {
    pool: Pool,
}

impl RedisSessionTrackingStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            warn!(error = %e, "redis pool checkout failed");
            PipelineError::BackendUnavailable(e.to_string())
        })
    }
}

#[async_trait]
impl LoginSessionTrackingStore for RedisSessionTrackingStore {
    #[instrument(skip(self), name = "session_tracking::increment_week")]
    async fn increment_week(&self, user_id: &str, week_key: &str) -> Result<u64> {
        let key = session_tracking_key(user_id);
        let mut conn = self.conn().await?;

        let new_count: u64 = conn.hincr(&key, week_key, 1_i64).await.map_err(|e| {
            warn!(error = %e, key = %key, "redis HINCRBY failed");
            PipelineError::BackendUnavailable(e.to_string())
        })?;

        let _: () = conn
            .expire(&key, SESSION_TRACKING_TTL_SECONDS)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "redis EXPIRE failed");
                PipelineError::BackendUnavailable(e.to_string())
            })?;

        Ok(new_count)
    }

    #[instrument(skip(self), name = "session_tracking::get_week")]
    async fn get_week(&self, user_id: &str, week_key: &str) -> Result<u64> {
        let key = session_tracking_key(user_id);
        let mut conn = self.conn().await?;
        let count: Option<u64> = conn.hget(&key, week_key).await.map_err(|e| {
            warn!(error = %e, key = %key, "redis HGET failed");
            PipelineError::BackendUnavailable(e.to_string())
        })?;
        Ok(count.unwrap_or(0))
    }

    #[instrument(skip(self), name = "session_tracking::get_all")]
    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, u64>> {
        let key = session_tracking_key(user_id);
        let mut conn = self.conn().await?;
        let all: HashMap<String, u64> = conn.hgetall(&key).await.map_err(|e| {
            warn!(error = %e, key = %key, "redis HGETALL failed");
            PipelineError::BackendUnavailable(e.to_string())
        })?;
        Ok(all)
    }

    #[instrument(skip(self), name = "session_tracking::prune_older_than")]
    async fn prune_older_than(&self, user_id: &str, week_key: &str) -> Result<()> {
        let key = session_tracking_key(user_id);
        let mut conn = self.conn().await?;

        let all: HashMap<String, u64> = conn.hgetall(&key).await.map_err(|e| {
            warn!(error = %e, key = %key, "redis HGETALL failed during prune");
            PipelineError::BackendUnavailable(e.to_string())
        })?;

        let stale: Vec<&String> = all.keys().filter(|k| k.as_str() < week_key).collect();
        if stale.is_empty() {
            return Ok(());
        }

        let _: () = conn.hdel(&key, stale).await.map_err(|e| {
            warn!(error = %e, key = %key, "redis HDEL failed during prune");
            PipelineError::BackendUnavailable(e.to_string())
        })?;
        Ok(())
    }
}
