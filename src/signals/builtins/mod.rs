// =============================================================================
// Built-in event processors (spec.md §4.3)
// =============================================================================

pub mod losing_streak_stat;
pub mod match_wins_stat;
pub mod oauth_login;
pub mod rage_quit_stat;

pub use losing_streak_stat::LosingStreakStatProcessor;
pub use match_wins_stat::MatchWinsStatProcessor;
pub use oauth_login::OauthLoginProcessor;
pub use rage_quit_stat::RageQuitStatProcessor;
