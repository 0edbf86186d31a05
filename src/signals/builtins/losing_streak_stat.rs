// =============================================================================
// Built-in processor: losing-streak stat update -> LosingStreak signal
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::signals::processor::{EventProcessor, SignalDraft};
use crate::signals::SignalType;

#[derive(Default)]
pub struct LosingStreakStatProcessor;

#[async_trait]
impl EventProcessor for LosingStreakStatProcessor {
    async fn process_event(
        &self,
        raw_event: &serde_json::Value,
        _user_id: &str,
        _namespace: &str,
    ) -> Result<Option<SignalDraft>> {
        let latest_value = raw_event["payload"]["latest_value"].as_f64().unwrap_or(0.0);
        Ok(Some(SignalDraft {
            kind: SignalType::LosingStreak,
            timestamp: Utc::now(),
            metadata: json!({ "streak": latest_value }),
        }))
    }
}
