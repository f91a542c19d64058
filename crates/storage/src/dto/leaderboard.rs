use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i32,
    pub user_id: Uuid,
    pub username: String,
    pub total_points: i64,
    pub total_bets: i64,
    pub correct_bets: i64,
    /// Share of bets that earned points, rounded to four places.
    pub accuracy: Decimal,
}

/// Ordered leaderboard snapshot. Ranks run `1..=entries.len()` without gaps.
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub league_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}
