// =============================================================================
// Built-in processor: match-wins stat update -> Win signal
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::errors::Result;
use crate::signals::processor::{EventProcessor, SignalDraft};
use crate::signals::SignalType;

#[derive(Default)]
pub struct MatchWinsStatProcessor;

#[async_trait]
impl EventProcessor for MatchWinsStatProcessor {
    async fn process_event(
        &self,
        raw_event: &serde_json::Value,
        _user_id: &str,
        _namespace: &str,
    ) -> Result<Option<SignalDraft>> {
        let latest_value = raw_event["payload"]["latest_value"].as_f64().unwrap_or(0.0);
        Ok(Some(SignalDraft {
            kind: SignalType::Win,
            timestamp: Utc::now(),
            metadata: json!({ "total_wins": latest_value }),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_win_with_total_wins_from_latest_value() {
        let processor = MatchWinsStatProcessor;
        let raw = serde_json::json!({ "payload": { "latest_value": 12.0 } });
        let draft = processor.process_event(&raw, "u1", "ns").await.unwrap().unwrap();
        assert_eq!(draft.kind, SignalType::Win);
        assert_eq!(draft.metadata["total_wins"], 12.0);
    }
}
