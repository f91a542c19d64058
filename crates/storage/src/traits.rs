use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::{
    DailyTotals, PointsUpdate, RankUpdate, ReplaceOutcome, ScoredBet, UserLeagueTotals,
};
use crate::error::Result;
use crate::models::{Bet, LeagueReportRecord, Match, UserBettingTrend, UserLeaguePerformance};

/// Read-only view of the League → Competition → Round → Match hierarchy.
#[async_trait::async_trait]
pub trait FixtureStore: Send + Sync {
    async fn league_exists(&self, league_id: Uuid) -> Result<bool>;

    async fn list_league_ids(&self) -> Result<Vec<Uuid>>;

    /// Matches reachable from the league, each returned once, ordered by id.
    async fn league_matches(&self, league_id: Uuid, page: PageRequest) -> Result<Vec<Match>>;
}

#[async_trait::async_trait]
pub trait BetLedger: Send + Sync {
    /// Bets placed on a match, ordered by id.
    async fn bets_for_match(&self, match_id: Uuid, page: PageRequest) -> Result<Vec<Bet>>;

    /// Overwrites `points_earned` for each bet. Returns the rows written.
    async fn set_points(&self, updates: &[PointsUpdate]) -> Result<u64>;

    /// Per-user totals summed from the ledger over the league's fixture set.
    async fn league_totals(&self, league_id: Uuid) -> Result<Vec<UserLeagueTotals>>;

    /// A user's bets on matches kicking off in `[from, to)`.
    async fn user_bets_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScoredBet>>;

    /// All bets within the league's fixture set, ordered by bet id.
    async fn league_scored_bets(&self, league_id: Uuid, page: PageRequest)
    -> Result<Vec<ScoredBet>>;

    async fn list_user_ids(&self, page: PageRequest) -> Result<Vec<Uuid>>;
}

/// Tables derived by the engine.
#[async_trait::async_trait]
pub trait AggregateStore: Send + Sync {
    /// Upserts the given totals and drops the league's rows for any user
    /// not among them.
    async fn replace_league_performance(
        &self,
        league_id: Uuid,
        totals: &[UserLeagueTotals],
    ) -> Result<ReplaceOutcome>;

    async fn league_performance(&self, league_id: Uuid) -> Result<Vec<UserLeaguePerformance>>;

    async fn store_ranks(&self, league_id: Uuid, ranks: &[RankUpdate]) -> Result<()>;

    async fn upsert_trend(&self, totals: &DailyTotals) -> Result<UserBettingTrend>;

    /// Snapshots dated on or after `since`, newest first.
    async fn user_trends_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<UserBettingTrend>>;

    async fn insert_report(
        &self,
        league_id: Uuid,
        report_type: &str,
        data: &serde_json::Value,
    ) -> Result<LeagueReportRecord>;
}

/// Per-league mutual exclusion between recomputation and leaderboard builds.
///
/// The lock is held for as long as the guard lives.
#[async_trait::async_trait]
pub trait LeagueLocks: Send + Sync {
    type Guard: Send;

    async fn lock(&self, league_id: Uuid) -> Result<Self::Guard>;
}

/// Everything the engine passes need from a store.
pub trait EngineStore: FixtureStore + BetLedger + AggregateStore + LeagueLocks {}

impl<T> EngineStore for T where T: FixtureStore + BetLedger + AggregateStore + LeagueLocks {}
