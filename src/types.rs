// =============================================================================
// Shared types used across the churn intervention engine
// =============================================================================

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Opaque platform user identifier. Kept as a plain `String` alias — the
/// pipeline never interprets its contents, only compares and namespaces it,
/// mirroring the teacher's treatment of `symbol: String` throughout
/// `strategy.rs` and `execution.rs`.
pub type UserId = String;

/// Tenant namespace a user's events belong to.
pub type Namespace = String;

/// Retention policy applied to `SignalHistory` and `InterventionHistory` on
/// every write. `spec.md` §9 recommends "the most recent 200 entries or 90
/// days, whichever is smaller"; both knobs are configurable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

fn default_max_entries() -> usize {
    200
}

fn default_max_age_days() -> i64 {
    90
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_age_days: default_max_age_days(),
        }
    }
}

impl RetentionPolicy {
    /// Trim `entries` in place to this policy, keeping the most recent
    /// `max_entries` items whose timestamp is within `max_age_days` of `now`.
    /// Entries are assumed to be in chronological (append) order.
    pub fn trim<T>(
        &self,
        entries: &mut Vec<T>,
        now: DateTime<Utc>,
        timestamp_of: impl Fn(&T) -> DateTime<Utc>,
    ) {
        let cutoff = now - chrono::Duration::days(self.max_age_days);
        entries.retain(|e| timestamp_of(e) >= cutoff);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(0..excess);
        }
    }
}

/// Format a UTC timestamp as an ISO-8601 week key (`YYYYWW`).
///
/// Uses `chrono`'s ISO week numbering, so week 1 is the week containing the
/// year's first Thursday — this determines which calendar dates land in
/// which bucket near year boundaries.
pub fn iso_week_key(at: DateTime<Utc>) -> String {
    let iso = at.iso_week();
    format!("{:04}{:02}", iso.year(), iso.week())
}
