use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Overwrite of one bet's `points_earned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsUpdate {
    pub bet_id: Uuid,
    pub points: i32,
}

/// Fresh per-user aggregate over a league's bets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserLeagueTotals {
    pub user_id: Uuid,
    pub total_bets: i64,
    pub correct_bets: i64,
    pub total_points: i64,
}

/// A bet's stored points together with its match kick-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScoredBet {
    pub bet_id: Uuid,
    pub user_id: Uuid,
    pub match_id: Uuid,
    pub match_date: DateTime<Utc>,
    pub points_earned: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankUpdate {
    pub user_id: Uuid,
    pub rank: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub upserted: u64,
    pub removed: u64,
}

/// Freshly computed totals for one user on one day, before they are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub total_bets: i64,
    pub correct_bets: i64,
    pub total_points: i64,
}

impl DailyTotals {
    pub fn from_bets<'a>(
        user_id: Uuid,
        date: NaiveDate,
        bets: impl IntoIterator<Item = &'a ScoredBet>,
    ) -> Self {
        let mut totals = Self {
            user_id,
            date,
            total_bets: 0,
            correct_bets: 0,
            total_points: 0,
        };
        for bet in bets {
            totals.total_bets += 1;
            if bet.points_earned > 0 {
                totals.correct_bets += 1;
            }
            totals.total_points += i64::from(bet.points_earned);
        }
        totals
    }
}
