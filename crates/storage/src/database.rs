use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::{
    DailyTotals, PointsUpdate, RankUpdate, ReplaceOutcome, ScoredBet, UserLeagueTotals,
};
use crate::error::Result;
use crate::models::{Bet, LeagueReportRecord, Match, UserBettingTrend, UserLeaguePerformance};
use crate::repository::bet::BetRepository;
use crate::repository::fixture::FixtureRepository;
use crate::repository::lock::{LeagueLockGuard, LockRepository};
use crate::repository::performance::PerformanceRepository;
use crate::repository::report::ReportRepository;
use crate::repository::trend::TrendRepository;
use crate::traits::{AggregateStore, BetLedger, FixtureStore, LeagueLocks};

/// PostgreSQL-backed store shared by every pass.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Every in-flight league pass keeps one connection for its advisory
    /// lock, so size the pool above the league concurrency.
    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FixtureStore for Database {
    async fn league_exists(&self, league_id: Uuid) -> Result<bool> {
        FixtureRepository::new(&self.pool).league_exists(league_id).await
    }

    async fn list_league_ids(&self) -> Result<Vec<Uuid>> {
        FixtureRepository::new(&self.pool).list_league_ids().await
    }

    async fn league_matches(&self, league_id: Uuid, page: PageRequest) -> Result<Vec<Match>> {
        FixtureRepository::new(&self.pool)
            .league_matches(league_id, page)
            .await
    }
}

#[async_trait::async_trait]
impl BetLedger for Database {
    async fn bets_for_match(&self, match_id: Uuid, page: PageRequest) -> Result<Vec<Bet>> {
        BetRepository::new(&self.pool)
            .list_for_match(match_id, page)
            .await
    }

    async fn set_points(&self, updates: &[PointsUpdate]) -> Result<u64> {
        BetRepository::new(&self.pool).set_points(updates).await
    }

    async fn league_totals(&self, league_id: Uuid) -> Result<Vec<UserLeagueTotals>> {
        BetRepository::new(&self.pool).league_totals(league_id).await
    }

    async fn user_bets_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScoredBet>> {
        BetRepository::new(&self.pool)
            .user_bets_between(user_id, from, to)
            .await
    }

    async fn league_scored_bets(
        &self,
        league_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ScoredBet>> {
        BetRepository::new(&self.pool)
            .league_scored_bets(league_id, page)
            .await
    }

    async fn list_user_ids(&self, page: PageRequest) -> Result<Vec<Uuid>> {
        BetRepository::new(&self.pool).list_user_ids(page).await
    }
}

#[async_trait::async_trait]
impl AggregateStore for Database {
    async fn replace_league_performance(
        &self,
        league_id: Uuid,
        totals: &[UserLeagueTotals],
    ) -> Result<ReplaceOutcome> {
        PerformanceRepository::new(&self.pool)
            .replace_for_league(league_id, totals)
            .await
    }

    async fn league_performance(&self, league_id: Uuid) -> Result<Vec<UserLeaguePerformance>> {
        PerformanceRepository::new(&self.pool)
            .list_for_league(league_id)
            .await
    }

    async fn store_ranks(&self, league_id: Uuid, ranks: &[RankUpdate]) -> Result<()> {
        PerformanceRepository::new(&self.pool)
            .store_ranks(league_id, ranks)
            .await
    }

    async fn upsert_trend(&self, totals: &DailyTotals) -> Result<UserBettingTrend> {
        TrendRepository::new(&self.pool).upsert(totals).await
    }

    async fn user_trends_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<UserBettingTrend>> {
        TrendRepository::new(&self.pool)
            .list_since(user_id, since)
            .await
    }

    async fn insert_report(
        &self,
        league_id: Uuid,
        report_type: &str,
        data: &serde_json::Value,
    ) -> Result<LeagueReportRecord> {
        ReportRepository::new(&self.pool)
            .insert(league_id, report_type, data)
            .await
    }
}

#[async_trait::async_trait]
impl LeagueLocks for Database {
    type Guard = LeagueLockGuard;

    async fn lock(&self, league_id: Uuid) -> Result<Self::Guard> {
        LockRepository::new(&self.pool).lock_league(league_id).await
    }
}
