// =============================================================================
// churnward — Main Entry Point
// =============================================================================
//
// Bootstraps the Signal -> Rule -> Action pipeline: load config, build the
// state-store backends, register built-in rules and actions, validate the
// wiring, then serve the ingress HTTP API.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use churnward::actions::{self, ActionExecutor, ActionFactory, ActionRegistry};
use churnward::api;
use churnward::churn_state::memory::InMemoryChurnStateStore;
use churnward::churn_state::redis_store::RedisChurnStateStore;
use churnward::churn_state::ChurnStateStore;
use churnward::config::{self, PipelineConfig};
use churnward::pipeline::PipelineManager;
use churnward::ports::{self, HttpEntitlementGranter, HttpUserStatisticUpdater};
use churnward::rules::{self, RuleEngine, RuleFactory, RuleRegistry};
use churnward::session_tracking::memory::InMemorySessionTrackingStore;
use churnward::session_tracking::redis_store::RedisSessionTrackingStore;
use churnward::session_tracking::LoginSessionTrackingStore;
use churnward::signals::{self, processor::{EventProcessorRegistry, SignalProcessor}};
use churnward::user_mutex::UserMutexTable;

const CHURN_STATE_KEY_PREFIX: &str = "churn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("churnward starting up");

    // ── 1. Config ─────────────────────────────────────────────────────────
    let config_path = std::env::var("CHURNWARD_CONFIG").unwrap_or_else(|_| "config/pipeline.yaml".to_string());
    let config = match config::load_from_file(&PathBuf::from(&config_path)).await {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, path = %config_path, "failed to load pipeline config, starting with an empty one");
            PipelineConfig { rules: vec![], actions: vec![] }
        }
    };

    // ── 2. State-store backends ──────────────────────────────────────────
    let (churn_state_store, session_tracking_store) = build_stores().await?;

    // ── 3. Outbound ports ─────────────────────────────────────────────────
    let entitlement_granter = std::env::var("CHURNWARD_ENTITLEMENT_BASE_URL").ok().map(|base_url| {
        let token = std::env::var("CHURNWARD_ENTITLEMENT_TOKEN").unwrap_or_default();
        Arc::new(HttpEntitlementGranter::new(base_url, token)) as Arc<dyn ports::EntitlementGranter>
    });
    let stat_updater = std::env::var("CHURNWARD_STAT_SERVICE_BASE_URL").ok().map(|base_url| {
        let token = std::env::var("CHURNWARD_STAT_SERVICE_TOKEN").unwrap_or_default();
        Arc::new(HttpUserStatisticUpdater::new(base_url, token)) as Arc<dyn ports::UserStatisticUpdater>
    });

    // ── 4. Signal processing ─────────────────────────────────────────────
    let event_processor_registry = Arc::new(EventProcessorRegistry::new());
    event_processor_registry.register(
        "oauth_token_generated",
        Arc::new(signals::builtins::OauthLoginProcessor::new(session_tracking_store.clone())),
    )?;
    event_processor_registry.register("rse-rage-quit", Arc::new(signals::builtins::RageQuitStatProcessor))?;
    event_processor_registry.register("rse-losing-streak", Arc::new(signals::builtins::LosingStreakStatProcessor))?;
    event_processor_registry.register("rse-match-wins", Arc::new(signals::builtins::MatchWinsStatProcessor))?;
    let signal_processor = Arc::new(SignalProcessor::new(event_processor_registry, churn_state_store.clone()));

    // ── 5. Rules ──────────────────────────────────────────────────────────
    let rule_factory = RuleFactory::new();
    rules::builtins::register_builtins(&rule_factory)?;
    let rule_registry = Arc::new(RuleRegistry::new());
    for rule_config in &config.rules {
        if !rule_config.enabled {
            continue;
        }
        let rule = rule_factory.build(rule_config)?;
        rule_registry.register(rule)?;
    }
    let rule_engine = Arc::new(RuleEngine::new(rule_registry.clone()));

    // ── 6. Actions ────────────────────────────────────────────────────────
    let action_factory = ActionFactory::new();
    actions::builtins::register_builtins(&action_factory, churn_state_store.clone(), entitlement_granter, stat_updater)?;
    let action_registry = Arc::new(ActionRegistry::new());
    for action_config in &config.actions {
        if !action_config.enabled {
            continue;
        }
        let action = action_factory.build(action_config)?;
        action_registry.register(action)?;
    }
    let action_executor = Arc::new(ActionExecutor::new(action_registry.clone()));

    // ── 7. Wiring validation (P6) ─────────────────────────────────────────
    config::wiring::validate_wiring(&config, &rule_registry, &action_registry)?;
    info!(rules = config.rules.len(), actions = config.actions.len(), "pipeline wiring validated");

    // ── 8. Pipeline manager ───────────────────────────────────────────────
    let pipeline = Arc::new(PipelineManager::new(
        signal_processor,
        rule_engine,
        action_executor,
        config.rule_actions_map(),
        Arc::new(UserMutexTable::new()),
    ));

    // ── 9. Serve ──────────────────────────────────────────────────────────
    let bind_addr = std::env::var("CHURNWARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let router = api::rest::router(pipeline);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}

async fn build_stores() -> anyhow::Result<(Arc<dyn ChurnStateStore>, Arc<dyn LoginSessionTrackingStore>)> {
    match std::env::var("CHURNWARD_REDIS_URL") {
        Ok(redis_url) => {
            info!("using redis-backed state stores");
            let cfg = deadpool_redis::Config::from_url(redis_url);
            let pool = cfg.create_pool(Some(deadpool_redis::Runtime::Tokio1))?;
            let churn_state_store = Arc::new(RedisChurnStateStore::new(pool.clone(), CHURN_STATE_KEY_PREFIX));
            let session_tracking_store = Arc::new(RedisSessionTrackingStore::new(pool));
            Ok((churn_state_store, session_tracking_store))
        }
        Err(_) => {
            warn!("CHURNWARD_REDIS_URL not set, using in-memory state stores (single-process only)");
            Ok((Arc::new(InMemoryChurnStateStore::new()), Arc::new(InMemorySessionTrackingStore::new())))
        }
    }
}
