use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::leaderboard::LeaderboardEntry;

/// JSON document stored in `league_reports.data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueReportData {
    pub league_id: Uuid,
    pub total_participants: u64,
    pub top_performers: Vec<TopPerformer>,
    pub bet_distribution: BetDistribution,
    pub participation_by_month: Vec<MonthlyParticipation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub rank: i32,
    pub username: String,
    pub total_points: i64,
}

impl From<LeaderboardEntry> for TopPerformer {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            username: entry.username,
            total_points: entry.total_points,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetDistribution {
    pub total_bets: u64,
    pub correct_bets: u64,
    pub perfect_bets: u64,
    pub by_points: Vec<PointsBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBucket {
    pub points: i32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyParticipation {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub total_bets: u64,
    pub total_points: i64,
}
