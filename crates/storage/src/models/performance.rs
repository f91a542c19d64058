use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Derived per-(user, league) totals. Never the system of record for points.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserLeaguePerformance {
    pub user_id: Uuid,
    pub league_id: Uuid,
    pub username: String,
    pub total_bets: i64,
    pub correct_bets: i64,
    pub total_points: i64,
    pub rank: i32,
    pub updated_at: DateTime<Utc>,
}
