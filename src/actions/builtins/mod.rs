// =============================================================================
// Built-in actions (spec.md §4.5)
// =============================================================================

pub mod dispatch_comeback_challenge;
pub mod grant_item;
pub mod send_email_notification;

pub use dispatch_comeback_challenge::DispatchComebackChallengeAction;
pub use grant_item::GrantItemAction;
pub use send_email_notification::SendEmailNotificationAction;

use std::sync::Arc;

use crate::actions::{Action, ActionFactory};
use crate::churn_state::ChurnStateStore;
use crate::errors::Result;
use crate::ports::{EntitlementGranter, UserStatisticUpdater};

/// Register every built-in action constructor against `factory`, closing
/// over the dependency bundle each one needs (spec.md §9: "built-ins
/// register themselves at startup via an explicit registration call
/// receiving a dependency bundle").
pub fn register_builtins(
    factory: &ActionFactory,
    churn_state_store: Arc<dyn ChurnStateStore>,
    entitlement_granter: Option<Arc<dyn EntitlementGranter>>,
    stat_updater: Option<Arc<dyn UserStatisticUpdater>>,
) -> Result<()> {
    {
        let churn_state_store = churn_state_store.clone();
        let stat_updater = stat_updater.clone();
        factory.register("dispatch_comeback_challenge", move |config| {
            Ok(Arc::new(DispatchComebackChallengeAction::from_config(
                config,
                churn_state_store.clone(),
                stat_updater.clone(),
            )?) as Arc<dyn Action>)
        })?;
    }

    {
        let entitlement_granter = entitlement_granter.clone();
        factory.register("grant_item", move |config| {
            Ok(Arc::new(GrantItemAction::from_config(config, entitlement_granter.clone())?) as Arc<dyn Action>)
        })?;
    }

    factory.register("send_email_notification_after_granting_item", |config| {
        Ok(Arc::new(SendEmailNotificationAction::from_config(config)?) as Arc<dyn Action>)
    })?;

    Ok(())
}
