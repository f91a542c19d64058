use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored daily trend snapshot, one row per (user, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserBettingTrend {
    pub user_id: Uuid,
    pub trend_date: NaiveDate,
    pub total_bets: i64,
    pub correct_bets: i64,
    pub total_points: i64,
    pub updated_at: DateTime<Utc>,
}
