// =============================================================================
// End-to-end pipeline scenarios (spec.md §8)
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use churnward::actions::{ActionConfig, ActionExecutor, ActionFactory, ActionRegistry};
use churnward::churn_state::memory::InMemoryChurnStateStore;
use churnward::churn_state::{ChurnState, ChurnStateStore};
use churnward::pipeline::PipelineManager;
use churnward::ports::fakes::{FakeEntitlementGranter, FakeUserStatisticUpdater};
use churnward::rules::{RuleConfig, RuleEngine, RuleFactory, RuleRegistry};
use churnward::session_tracking::memory::InMemorySessionTrackingStore;
use churnward::session_tracking::LoginSessionTrackingStore;
use churnward::signals::builtins::{
    LosingStreakStatProcessor, MatchWinsStatProcessor, OauthLoginProcessor, RageQuitStatProcessor,
};
use churnward::signals::events::{OauthTokenGenerated, StatItemUpdated, StatPayload};
use churnward::signals::processor::{EventProcessorRegistry, SignalProcessor};
use churnward::types::iso_week_key;
use churnward::user_mutex::UserMutexTable;

struct Harness {
    pipeline: Arc<PipelineManager>,
    churn_state_store: Arc<InMemoryChurnStateStore>,
    session_tracking_store: Arc<InMemorySessionTrackingStore>,
    entitlement_granter: Arc<FakeEntitlementGranter>,
}

fn build_harness(rule_configs: Vec<RuleConfig>, action_configs: Vec<ActionConfig>, entitlement_granter: Arc<FakeEntitlementGranter>) -> Harness {
    let churn_state_store = Arc::new(InMemoryChurnStateStore::new());
    let session_tracking_store = Arc::new(InMemorySessionTrackingStore::new());

    let event_processor_registry = Arc::new(EventProcessorRegistry::new());
    event_processor_registry
        .register("oauth_token_generated", Arc::new(OauthLoginProcessor::new(session_tracking_store.clone())))
        .unwrap();
    event_processor_registry.register("rse-rage-quit", Arc::new(RageQuitStatProcessor)).unwrap();
    event_processor_registry
        .register("rse-losing-streak", Arc::new(LosingStreakStatProcessor))
        .unwrap();
    event_processor_registry.register("rse-match-wins", Arc::new(MatchWinsStatProcessor)).unwrap();
    let signal_processor = Arc::new(SignalProcessor::new(event_processor_registry, churn_state_store.clone() as Arc<dyn ChurnStateStore>));

    let rule_factory = RuleFactory::new();
    churnward::rules::builtins::register_builtins(&rule_factory).unwrap();
    let rule_registry = Arc::new(RuleRegistry::new());
    for rc in &rule_configs {
        rule_registry.register(rule_factory.build(rc).unwrap()).unwrap();
    }
    let rule_engine = Arc::new(RuleEngine::new(rule_registry));

    let action_factory = ActionFactory::new();
    churnward::actions::builtins::register_builtins(
        &action_factory,
        churn_state_store.clone() as Arc<dyn ChurnStateStore>,
        Some(entitlement_granter.clone() as Arc<dyn churnward::ports::EntitlementGranter>),
        Some(Arc::new(FakeUserStatisticUpdater::new()) as Arc<dyn churnward::ports::UserStatisticUpdater>),
    )
    .unwrap();
    let action_registry = Arc::new(ActionRegistry::new());
    for ac in &action_configs {
        action_registry.register(action_factory.build(ac).unwrap()).unwrap();
    }
    let action_executor = Arc::new(ActionExecutor::new(action_registry));

    let rule_actions: HashMap<String, Vec<String>> = rule_configs.iter().map(|r| (r.id.clone(), r.actions.clone())).collect();

    let pipeline = Arc::new(PipelineManager::new(
        signal_processor,
        rule_engine,
        action_executor,
        rule_actions,
        Arc::new(UserMutexTable::new()),
    ));

    Harness {
        pipeline,
        churn_state_store,
        session_tracking_store,
        entitlement_granter,
    }
}

fn rage_quit_rule(threshold: u64, actions: Vec<&str>) -> RuleConfig {
    RuleConfig {
        id: "rage_quit_rule".into(),
        rule_type: "rage_quit".into(),
        enabled: true,
        priority: 0,
        actions: actions.into_iter().map(str::to_string).collect(),
        cooldown: None,
        parameters: json!({ "threshold": threshold }),
    }
}

fn dispatch_action() -> ActionConfig {
    ActionConfig {
        id: "dispatch_comeback_challenge".into(),
        action_type: "dispatch_comeback_challenge".into(),
        enabled: true,
        r#async: false,
        retry: None,
        parameters: serde_json::Value::Null,
    }
}

fn grant_item_action(id: &str, item_id: &str) -> ActionConfig {
    ActionConfig {
        id: id.to_string(),
        action_type: "grant_item".into(),
        enabled: true,
        r#async: false,
        retry: None,
        parameters: json!({ "item_id": item_id, "quantity": 1 }),
    }
}

fn stat_event(user_id: &str, stat_code: &str, latest_value: f64) -> StatItemUpdated {
    StatItemUpdated {
        user_id: user_id.to_string(),
        namespace: "ns".to_string(),
        payload: StatPayload {
            user_id: user_id.to_string(),
            stat_code: stat_code.to_string(),
            latest_value,
        },
    }
}

#[tokio::test]
async fn scenario_1_rage_quit_triggers_challenge() {
    let granter = Arc::new(FakeEntitlementGranter::new());
    let harness = build_harness(
        vec![rage_quit_rule(3, vec!["dispatch_comeback_challenge", "grant_item_booster_a"])],
        vec![dispatch_action(), grant_item_action("grant_item_booster_a", "BOOSTER_A")],
        granter.clone(),
    );

    let before = Utc::now();
    harness.pipeline.process_stat_event(stat_event("U1", "rse-rage-quit", 3.0)).await.unwrap();

    let state = harness.churn_state_store.get_churn_state("ns", "U1").await.unwrap();
    assert!(state.has_active_intervention("dispatch_comeback_challenge"));
    let cooldown_until = state.cooldown.cooldown_until.unwrap();
    assert!(cooldown_until >= before + Duration::hours(48) && cooldown_until <= Utc::now() + Duration::hours(48));

    let calls = harness.entitlement_granter.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], ("ns".to_string(), "U1".to_string(), "BOOSTER_A".to_string(), 1));
}

#[tokio::test]
async fn scenario_2_below_threshold_is_a_no_op() {
    let granter = Arc::new(FakeEntitlementGranter::new());
    let harness = build_harness(
        vec![rage_quit_rule(3, vec!["dispatch_comeback_challenge", "grant_item_booster_a"])],
        vec![dispatch_action(), grant_item_action("grant_item_booster_a", "BOOSTER_A")],
        granter,
    );

    harness.pipeline.process_stat_event(stat_event("U1", "rse-rage-quit", 2.0)).await.unwrap();

    let state = harness.churn_state_store.get_churn_state("ns", "U1").await.unwrap();
    assert!(state.intervention_history.is_empty());
    assert!(state.cooldown.cooldown_until.is_none());
    assert!(harness.entitlement_granter.calls.lock().is_empty());
}

#[tokio::test]
async fn scenario_3_cooldown_suppresses_second_intervention() {
    let granter = Arc::new(FakeEntitlementGranter::new());
    let harness = build_harness(
        vec![rage_quit_rule(3, vec!["dispatch_comeback_challenge", "grant_item_booster_a"])],
        vec![dispatch_action(), grant_item_action("grant_item_booster_a", "BOOSTER_A")],
        granter,
    );

    let mut preloaded = ChurnState::default();
    preloaded.cooldown.extend_until(Utc::now() + Duration::hours(1));
    harness.churn_state_store.update_churn_state("ns", "U1", &preloaded).await.unwrap();

    harness.pipeline.process_stat_event(stat_event("U1", "rse-rage-quit", 3.0)).await.unwrap();

    let state = harness.churn_state_store.get_churn_state("ns", "U1").await.unwrap();
    assert!(state.intervention_history.is_empty());
    assert!(harness.entitlement_granter.calls.lock().is_empty());
}

#[tokio::test]
async fn scenario_4_session_decline_detection() {
    let granter = Arc::new(FakeEntitlementGranter::new());
    let session_decline_rule = RuleConfig {
        id: "session_decline_rule".into(),
        rule_type: "session_decline".into(),
        enabled: true,
        priority: 0,
        actions: vec!["dispatch_comeback_challenge".into()],
        cooldown: None,
        parameters: serde_json::Value::Null,
    };
    let harness = build_harness(vec![session_decline_rule], vec![dispatch_action()], granter);

    let current_week = iso_week_key(Utc::now());
    let mut prior_week_a = "190001".to_string();
    let mut prior_week_b = "190002".to_string();
    if prior_week_a == current_week {
        prior_week_a = "190003".to_string();
    }
    if prior_week_b == current_week {
        prior_week_b = "190004".to_string();
    }
    for _ in 0..5 {
        harness.session_tracking_store.increment_week("U2", &prior_week_a).await.unwrap();
    }
    for _ in 0..4 {
        harness.session_tracking_store.increment_week("U2", &prior_week_b).await.unwrap();
    }

    harness
        .pipeline
        .process_oauth_event(OauthTokenGenerated {
            user_id: "U2".to_string(),
            namespace: "ns".to_string(),
        })
        .await
        .unwrap();

    let this_week_count = harness.session_tracking_store.get_week("U2", &current_week).await.unwrap();
    assert_eq!(this_week_count, 1);

    let state = harness.churn_state_store.get_churn_state("ns", "U2").await.unwrap();
    assert!(state.has_active_intervention("dispatch_comeback_challenge"));
}

#[tokio::test]
async fn scenario_5_multi_action_rollback_on_partial_failure() {
    let granter = Arc::new(FakeEntitlementGranter::failing_for("MISSING"));
    let harness = build_harness(
        vec![rage_quit_rule(3, vec!["dispatch_comeback_challenge", "grant_item_missing"])],
        vec![dispatch_action(), grant_item_action("grant_item_missing", "MISSING")],
        granter,
    );

    harness.pipeline.process_stat_event(stat_event("U1", "rse-rage-quit", 3.0)).await.unwrap();

    let state = harness.churn_state_store.get_churn_state("ns", "U1").await.unwrap();
    assert!(!state.has_active_intervention("dispatch_comeback_challenge"));
    let dispatched = state
        .intervention_history
        .iter()
        .find(|r| r.intervention_type == "dispatch_comeback_challenge")
        .expect("an intervention record should exist from the rolled-back execute");
    assert_eq!(dispatched.outcome, churnward::churn_state::InterventionOutcome::Failed);
    assert!(state.cooldown.cooldown_until.is_none());
    assert!(harness.entitlement_granter.calls.lock().is_empty());
}

#[tokio::test]
async fn scenario_6_unknown_stat_code_is_a_no_op() {
    let granter = Arc::new(FakeEntitlementGranter::new());
    let harness = build_harness(
        vec![rage_quit_rule(3, vec!["dispatch_comeback_challenge"])],
        vec![dispatch_action()],
        granter,
    );

    harness.pipeline.process_stat_event(stat_event("U1", "unknown-xyz", 99.0)).await.unwrap();

    let state = harness.churn_state_store.get_churn_state("ns", "U1").await.unwrap();
    assert!(state.signal_history.is_empty());
    assert!(state.intervention_history.is_empty());
}
