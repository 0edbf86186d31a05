// =============================================================================
// Signal Processor and Event-Processor Registry (spec.md §4.3)
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{instrument, warn};

use super::events::{OauthTokenGenerated, StatItemUpdated};
use super::{PlayerContext, Signal, SignalType};
use crate::churn_state::{ChurnStateStore, SignalHistoryEntry};
use crate::errors::{PipelineError, Result};
use crate::types::RetentionPolicy;

/// What a registered `EventProcessor` hands back before the `PlayerContext`
/// is attached — keeps processors free of the borrow-juggling that
/// assembling the final, context-carrying `Signal` would otherwise require.
#[derive(Debug, Clone)]
pub struct SignalDraft {
    pub kind: SignalType,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

/// Capability `{ProcessEvent(ctx, rawEvent, playerCtx) -> Signal | nil}`
/// (spec.md §4.3). Implementations may hold their own dependency bundle
/// (e.g. the session tracking store) injected at registration time.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process_event(
        &self,
        raw_event: &serde_json::Value,
        user_id: &str,
        namespace: &str,
    ) -> Result<Option<SignalDraft>>;
}

/// Mapping from event-kind key to `EventProcessor`. Keys are either a
/// signal-domain key (`"oauth_token_generated"`) or a stat-code string
/// (`"rse-rage-quit"`). Read-mostly: registration happens once at startup
/// behind a write lock, lookups are frequent and read-locked.
#[derive(Default)]
pub struct EventProcessorRegistry {
    processors: RwLock<HashMap<String, Arc<dyn EventProcessor>>>,
}

impl EventProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `processor` under `key`. Re-registering the same key fails
    /// with `ErrDuplicate`, leaving the original entry intact (P4).
    pub fn register(&self, key: impl Into<String>, processor: Arc<dyn EventProcessor>) -> Result<()> {
        let key = key.into();
        let mut guard = self.processors.write();
        if guard.contains_key(&key) {
            return Err(PipelineError::Duplicate(key));
        }
        guard.insert(key, processor);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn EventProcessor>> {
        self.processors.read().get(key).cloned()
    }
}

/// Converts raw inbound events into enriched signals. Stateless itself; all
/// durable state lives behind `churn_state_store` and whatever the
/// registered processors hold.
pub struct SignalProcessor {
    registry: Arc<EventProcessorRegistry>,
    churn_state_store: Arc<dyn ChurnStateStore>,
}

impl SignalProcessor {
    pub fn new(registry: Arc<EventProcessorRegistry>, churn_state_store: Arc<dyn ChurnStateStore>) -> Self {
        Self {
            registry,
            churn_state_store,
        }
    }

    #[instrument(skip(self, event), fields(user_id = %event.user_id))]
    pub async fn process_oauth_event(&self, event: OauthTokenGenerated) -> Result<Option<Signal>> {
        if event.user_id.is_empty() {
            return Ok(None);
        }
        self.dispatch("oauth_token_generated", &event.user_id, &event.namespace, &event).await
    }

    #[instrument(skip(self, event), fields(user_id = %event.user_id, stat_code = %event.payload.stat_code))]
    pub async fn process_stat_event(&self, event: StatItemUpdated) -> Result<Option<Signal>> {
        if event.user_id.is_empty() {
            return Ok(None);
        }
        let key = event.payload.stat_code.clone();
        self.dispatch(&key, &event.user_id, &event.namespace, &event).await
    }

    async fn dispatch<E: serde::Serialize>(
        &self,
        key: &str,
        user_id: &str,
        namespace: &str,
        raw_event: &E,
    ) -> Result<Option<Signal>> {
        let Some(processor) = self.registry.get(key) else {
            warn!(key, "no event processor registered for key — dropping event silently");
            return Ok(None);
        };

        let mut state = self.churn_state_store.get_churn_state(namespace, user_id).await?;

        let raw_value = serde_json::to_value(raw_event).expect("event serialization cannot fail");
        let draft = processor.process_event(&raw_value, user_id, namespace).await?;

        let Some(draft) = draft else {
            return Ok(None);
        };

        // Append to SignalHistory and stamp Cooldown.LastSignalAt (spec.md
        // §3) before the signal is handed to the rule engine, so every
        // recognized occurrence is durably recorded even if no rule fires.
        state.push_signal(
            SignalHistoryEntry {
                signal_type: draft.kind.to_string(),
                timestamp: draft.timestamp,
                metadata: draft.metadata.clone(),
            },
            RetentionPolicy::default(),
            draft.timestamp,
        );
        state.cooldown.record_signal(&draft.kind.to_string(), draft.timestamp);
        self.churn_state_store.update_churn_state(namespace, user_id, &state).await?;

        let context = PlayerContext::new(user_id.to_string(), namespace.to_string(), state);
        Ok(Some(Signal::new(draft.kind, user_id.to_string(), draft.timestamp, draft.metadata, context)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::churn_state::memory::InMemoryChurnStateStore;

    struct AlwaysNoneProcessor;

    #[async_trait]
    impl EventProcessor for AlwaysNoneProcessor {
        async fn process_event(&self, _raw: &serde_json::Value, _u: &str, _n: &str) -> Result<Option<SignalDraft>> {
            Ok(None)
        }
    }

    struct AlwaysLoginProcessor;

    #[async_trait]
    impl EventProcessor for AlwaysLoginProcessor {
        async fn process_event(&self, _raw: &serde_json::Value, _u: &str, _n: &str) -> Result<Option<SignalDraft>> {
            Ok(Some(SignalDraft {
                kind: SignalType::Login,
                timestamp: Utc::now(),
                metadata: serde_json::json!({ "this_week": 1 }),
            }))
        }
    }

    #[test]
    fn registry_rejects_duplicate_registration() {
        let registry = EventProcessorRegistry::new();
        registry.register("k1", Arc::new(AlwaysNoneProcessor)).unwrap();
        let err = registry.register("k1", Arc::new(AlwaysNoneProcessor)).unwrap_err();
        assert!(matches!(err, PipelineError::Duplicate(_)));
    }

    #[tokio::test]
    async fn empty_user_id_is_dropped_silently() {
        let registry = Arc::new(EventProcessorRegistry::new());
        let store = Arc::new(InMemoryChurnStateStore::new());
        let processor = SignalProcessor::new(registry, store);
        let result = processor
            .process_oauth_event(OauthTokenGenerated {
                user_id: String::new(),
                namespace: "ns".into(),
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unregistered_key_yields_no_signal_not_an_error() {
        let registry = Arc::new(EventProcessorRegistry::new());
        let store = Arc::new(InMemoryChurnStateStore::new());
        let processor = SignalProcessor::new(registry, store);
        let result = processor
            .process_stat_event(StatItemUpdated {
                user_id: "u1".into(),
                namespace: "ns".into(),
                payload: super::super::events::StatPayload {
                    user_id: "u1".into(),
                    stat_code: "unknown-xyz".into(),
                    latest_value: 1.0,
                },
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn a_recognized_signal_is_appended_to_history_and_stamps_last_signal_at() {
        let registry = Arc::new(EventProcessorRegistry::new());
        registry.register("oauth_token_generated", Arc::new(AlwaysLoginProcessor)).unwrap();
        let store = Arc::new(InMemoryChurnStateStore::new());
        let processor = SignalProcessor::new(registry, store.clone());

        let signal = processor
            .process_oauth_event(OauthTokenGenerated {
                user_id: "u1".into(),
                namespace: "ns".into(),
            })
            .await
            .unwrap();
        assert!(signal.is_some());

        let persisted = store.get_churn_state("ns", "u1").await.unwrap();
        assert_eq!(persisted.signal_history.len(), 1);
        assert_eq!(persisted.signal_history[0].signal_type, "login");
        assert!(persisted.cooldown.last_signal_at.contains_key("login"));
    }
}
