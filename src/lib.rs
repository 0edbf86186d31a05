// =============================================================================
// churnward — server-side event-driven player-churn intervention engine
// =============================================================================
//
// Library surface for the Signal -> Rule -> Action pipeline (see
// SPEC_FULL.md). `main.rs` wires this up into a running service; integration
// tests exercise it directly through this crate root.
// =============================================================================

pub mod actions;
pub mod api;
pub mod churn_state;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod ports;
pub mod rules;
pub mod session_tracking;
pub mod signals;
pub mod types;
pub mod user_mutex;
