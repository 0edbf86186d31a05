// =============================================================================
// Built-in rules (spec.md §4.4)
// =============================================================================

pub mod losing_streak;
pub mod rage_quit;
pub mod session_decline;

pub use losing_streak::LosingStreakRule;
pub use rage_quit::RageQuitRule;
pub use session_decline::SessionDeclineRule;

use std::sync::Arc;

use crate::errors::Result;
use crate::rules::RuleFactory;

/// Register every built-in rule constructor against `factory`. Called once
/// at startup from `main.rs`'s dependency-bundle wiring (spec.md §9).
pub fn register_builtins(factory: &RuleFactory) -> Result<()> {
    factory.register("rage_quit", |config| Ok(Arc::new(RageQuitRule::from_config(config)?)))?;
    factory.register("losing_streak", |config| Ok(Arc::new(LosingStreakRule::from_config(config)?)))?;
    factory.register("session_decline", |config| Ok(Arc::new(SessionDeclineRule::from_config(config)?)))?;
    Ok(())
}
