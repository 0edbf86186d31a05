// =============================================================================
// Per-user in-process mutex — load-modify-save race mitigation
// =============================================================================
//
// Spec.md §5 lists two acceptable mitigations for the per-player
// load-modify-save race and leaves the choice open, explicitly scoping
// either one to what the deployment needs. This crate implements the
// in-process mutex, appropriate for the single-instance deployment the
// teacher's own binary targets (`RiskEngine`'s single in-process
// `RwLock<Inner>` makes the same assumption) — it does nothing for
// multi-instance deployments, which need the backend CAS alternative
// instead (not implemented here; see DESIGN.md).
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily-created per-user async mutexes. Entries are never removed — the
/// number of distinct users is bounded by the deployment's player base, not
/// by event volume, so this is an acceptable long-lived footprint.
#[derive(Default)]
pub struct UserMutexTable {
    locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserMutexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `user_id`, blocking (asynchronously) until any
    /// concurrent holder for the same user releases it. Distinct users never
    /// contend with each other.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock();
            locks.entry(user_id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let table = Arc::new(UserMutexTable::new());
        let counter = Arc::new(AtomicU32::new(0));
        let max_concurrent = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let table = table.clone();
            let counter = counter.clone();
            let max_concurrent = max_concurrent.clone();
            handles.push(tokio::spawn(async move {
                let _guard = table.lock("u1").await;
                let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
                max_concurrent.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(max_concurrent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_users_do_not_contend() {
        let table = Arc::new(UserMutexTable::new());
        let g1 = table.lock("u1").await;
        let g2_fut = table.lock("u2");
        let g2 = tokio::time::timeout(Duration::from_millis(50), g2_fut).await;
        assert!(g2.is_ok());
        drop(g1);
    }
}
