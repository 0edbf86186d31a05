// =============================================================================
// Built-in processor: OauthTokenGenerated -> Login signal
// =============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::session_tracking::LoginSessionTrackingStore;
use crate::signals::processor::{EventProcessor, SignalDraft};
use crate::signals::SignalType;
use crate::types::iso_week_key;

/// Increments the current ISO-week login bucket and emits `Login` with
/// `{this_week, prior_weeks_sum, weeks_with_activity}` (spec.md §4.3).
pub struct OauthLoginProcessor {
    session_store: Arc<dyn LoginSessionTrackingStore>,
}

impl OauthLoginProcessor {
    pub fn new(session_store: Arc<dyn LoginSessionTrackingStore>) -> Self {
        Self { session_store }
    }
}

#[async_trait]
impl EventProcessor for OauthLoginProcessor {
    async fn process_event(
        &self,
        _raw_event: &serde_json::Value,
        user_id: &str,
        _namespace: &str,
    ) -> Result<Option<SignalDraft>> {
        let now = Utc::now();
        let current_week = iso_week_key(now);

        let this_week = self.session_store.increment_week(user_id, &current_week).await?;
        let all_weeks = self.session_store.get_all(user_id).await?;

        let prior_weeks_sum: u64 = all_weeks
            .iter()
            .filter(|(week, _)| **week != current_week)
            .map(|(_, count)| *count)
            .sum();
        let weeks_with_activity = all_weeks
            .iter()
            .filter(|(week, count)| **week != current_week && **count > 0)
            .count();

        Ok(Some(SignalDraft {
            kind: SignalType::Login,
            timestamp: now,
            metadata: json!({
                "this_week": this_week,
                "prior_weeks_sum": prior_weeks_sum,
                "weeks_with_activity": weeks_with_activity,
            }),
        }))
    }
}
