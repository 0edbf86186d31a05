// =============================================================================
// Built-in processor: rage-quit stat update -> RageQuit signal
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::signals::processor::{EventProcessor, SignalDraft};
use crate::signals::SignalType;

#[derive(Default)]
pub struct RageQuitStatProcessor;

#[async_trait]
impl EventProcessor for RageQuitStatProcessor {
    async fn process_event(
        &self,
        raw_event: &serde_json::Value,
        _user_id: &str,
        _namespace: &str,
    ) -> Result<Option<SignalDraft>> {
        let latest_value = raw_event["payload"]["latest_value"].as_f64().unwrap_or(0.0);
        Ok(Some(SignalDraft {
            kind: SignalType::RageQuit,
            timestamp: Utc::now(),
            metadata: json!({ "quit_count": latest_value }),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_rage_quit_with_quit_count_from_latest_value() {
        let processor = RageQuitStatProcessor;
        let raw = serde_json::json!({ "payload": { "latest_value": 3.0 } });
        let draft = processor.process_event(&raw, "u1", "ns").await.unwrap().unwrap();
        assert_eq!(draft.kind, SignalType::RageQuit);
        assert_eq!(draft.metadata["quit_count"], 3.0);
    }
}
