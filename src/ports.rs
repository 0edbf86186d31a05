// =============================================================================
// Outbound ports — external platform collaborators (spec.md §6)
// =============================================================================
//
// `EntitlementGranter` and `UserStatisticUpdater` are the two outbound ports
// the action executor calls through. Idempotency of the grant call is the
// granter's responsibility, not ours. The HTTP clients below follow the same
// shape as the teacher's `BinanceClient`: a thin `reqwest::Client` wrapper,
// one `#[instrument]`ed method per endpoint, `anyhow` at the boundary. Unlike
// the trading engine's signed HMAC requests, the platform's internal
// services here are assumed to sit behind the caller's own auth middleware,
// so only a bearer token is attached.
// =============================================================================

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument, warn};

/// Source tag the spec attaches to every grant originating from this engine.
const GRANT_SOURCE: &str = "REWARD";

#[async_trait]
pub trait EntitlementGranter: Send + Sync {
    async fn grant_entitlement(&self, namespace: &str, user_id: &str, item_id: &str, quantity: u32) -> anyhow::Result<()>;
}

#[async_trait]
pub trait UserStatisticUpdater: Send + Sync {
    async fn update_stat_comeback_challenge(&self, namespace: &str, user_id: &str) -> anyhow::Result<()>;
}

/// Reference `EntitlementGranter` calling a platform HTTP entitlement
/// service.
#[derive(Clone)]
pub struct HttpEntitlementGranter {
    base_url: String,
    bearer_token: String,
    client: reqwest::Client,
}

impl HttpEntitlementGranter {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            client,
        }
    }
}

#[async_trait]
impl EntitlementGranter for HttpEntitlementGranter {
    #[instrument(skip(self), name = "entitlement::grant")]
    async fn grant_entitlement(&self, namespace: &str, user_id: &str, item_id: &str, quantity: u32) -> anyhow::Result<()> {
        let url = format!("{}/v1/entitlements/grant", self.base_url);
        let body = json!({
            "namespace": namespace,
            "user_id": user_id,
            "item_id": item_id,
            "quantity": quantity,
            "source": GRANT_SOURCE,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, body = %text, "entitlement grant request failed");
            anyhow::bail!("entitlement grant failed with status {status}: {text}");
        }

        debug!(user_id, item_id, quantity, "entitlement granted");
        Ok(())
    }
}

/// Reference `UserStatisticUpdater` calling a platform HTTP stat service.
#[derive(Clone)]
pub struct HttpUserStatisticUpdater {
    base_url: String,
    bearer_token: String,
    client: reqwest::Client,
}

impl HttpUserStatisticUpdater {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            client,
        }
    }
}

#[async_trait]
impl UserStatisticUpdater for HttpUserStatisticUpdater {
    #[instrument(skip(self), name = "user_statistic::update_comeback_challenge")]
    async fn update_stat_comeback_challenge(&self, namespace: &str, user_id: &str) -> anyhow::Result<()> {
        let url = format!("{}/v1/stats/comeback-challenge", self.base_url);
        let body = json!({ "namespace": namespace, "user_id": user_id });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "comeback-challenge stat update failed");
            anyhow::bail!("stat update failed with status {status}");
        }
        Ok(())
    }
}

/// Fakes for exercising the pipeline without real HTTP collaborators.
/// Not `#[cfg(test)]`-gated: `tests/pipeline_scenarios.rs` is a separate
/// compilation unit from this crate and needs these visible as ordinary
/// library items.
pub mod fakes {
    use super::*;
    use parking_lot::Mutex;

    /// In-memory `EntitlementGranter` recording every call; test mode per
    /// spec.md §4.5 ("if granter is nil ... log and succeed" — here the
    /// equivalent is simply omitting this fake and passing `None`).
    #[derive(Default)]
    pub struct FakeEntitlementGranter {
        pub calls: Mutex<Vec<(String, String, String, u32)>>,
        pub fail_for_item: Option<String>,
    }

    impl FakeEntitlementGranter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_for(item_id: impl Into<String>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_for_item: Some(item_id.into()),
            }
        }
    }

    #[async_trait]
    impl EntitlementGranter for FakeEntitlementGranter {
        async fn grant_entitlement(&self, namespace: &str, user_id: &str, item_id: &str, quantity: u32) -> anyhow::Result<()> {
            if self.fail_for_item.as_deref() == Some(item_id) {
                anyhow::bail!("simulated grant failure for {item_id}");
            }
            self.calls
                .lock()
                .push((namespace.to_string(), user_id.to_string(), item_id.to_string(), quantity));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeUserStatisticUpdater {
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeUserStatisticUpdater {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserStatisticUpdater for FakeUserStatisticUpdater {
        async fn update_stat_comeback_challenge(&self, _namespace: &str, user_id: &str) -> anyhow::Result<()> {
            self.calls.lock().push(user_id.to_string());
            Ok(())
        }
    }
}
