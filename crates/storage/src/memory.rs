//! In-process implementation of the store traits.
//!
//! Mirrors the PostgreSQL adapter's semantics closely enough to exercise the
//! engine passes without a database, and can be told to fail selected writes
//! to drive the error paths.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::{
    DailyTotals, PointsUpdate, RankUpdate, ReplaceOutcome, ScoredBet, UserLeagueTotals,
};
use crate::error::{Result, StorageError};
use crate::models::{
    Bet, Competition, League, LeagueReportRecord, Match, Round, User, UserBettingTrend,
    UserLeaguePerformance,
};
use crate::traits::{AggregateStore, BetLedger, FixtureStore, LeagueLocks};

#[derive(Default)]
struct Inner {
    leagues: BTreeMap<Uuid, League>,
    competitions: BTreeMap<Uuid, Competition>,
    competition_leagues: BTreeSet<(Uuid, Uuid)>,
    rounds: BTreeMap<Uuid, Round>,
    matches: BTreeMap<Uuid, Match>,
    users: BTreeMap<Uuid, User>,
    bets: BTreeMap<Uuid, Bet>,
    performance: BTreeMap<(Uuid, Uuid), UserLeaguePerformance>,
    trends: BTreeMap<(Uuid, NaiveDate), UserBettingTrend>,
    reports: Vec<LeagueReportRecord>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    trend_users: HashSet<Uuid>,
    point_writes_left: Option<usize>,
}

impl Inner {
    fn match_in_league(&self, match_id: Uuid, league_id: Uuid) -> bool {
        self.matches
            .get(&match_id)
            .and_then(|m| self.rounds.get(&m.round_id))
            .is_some_and(|r| {
                self.competition_leagues
                    .contains(&(r.competition_id, league_id))
            })
    }

    fn scored(&self, bet: &Bet) -> Option<ScoredBet> {
        let fixture = self.matches.get(&bet.match_id)?;
        Some(ScoredBet {
            bet_id: bet.bet_id,
            user_id: bet.user_id,
            match_id: bet.match_id,
            match_date: fixture.match_date,
            points_earned: bet.points_earned,
        })
    }
}

fn unavailable() -> StorageError {
    StorageError::Database(sqlx::Error::PoolTimedOut)
}

fn after(page: &PageRequest, id: &Uuid) -> bool {
    page.after.is_none_or(|after| *id > after)
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_league(&self, name: &str, season: &str) -> Uuid {
        let league_id = Uuid::new_v4();
        self.inner().leagues.insert(
            league_id,
            League {
                league_id,
                name: name.to_string(),
                season: season.to_string(),
            },
        );
        league_id
    }

    /// Adds a competition and links it to the given leagues.
    pub fn add_competition(&self, name: &str, league_ids: &[Uuid]) -> Uuid {
        let competition_id = Uuid::new_v4();
        let today = Utc::now().date_naive();
        let mut inner = self.inner();
        inner.competitions.insert(
            competition_id,
            Competition {
                competition_id,
                name: name.to_string(),
                start_date: today,
                end_date: today,
            },
        );
        for &league_id in league_ids {
            inner.competition_leagues.insert((competition_id, league_id));
        }
        competition_id
    }

    pub fn link_competition(&self, competition_id: Uuid, league_id: Uuid) {
        self.inner()
            .competition_leagues
            .insert((competition_id, league_id));
    }

    pub fn unlink_competition(&self, competition_id: Uuid, league_id: Uuid) {
        self.inner()
            .competition_leagues
            .remove(&(competition_id, league_id));
    }

    pub fn add_round(&self, competition_id: Uuid, name: &str) -> Uuid {
        let round_id = Uuid::new_v4();
        self.inner().rounds.insert(
            round_id,
            Round {
                round_id,
                competition_id,
                name: name.to_string(),
                deadline: Utc::now(),
            },
        );
        round_id
    }

    pub fn add_match(&self, round_id: Uuid, match_date: DateTime<Utc>) -> Uuid {
        let match_id = Uuid::new_v4();
        self.inner().matches.insert(
            match_id,
            Match {
                match_id,
                round_id,
                match_date,
                home_score: None,
                away_score: None,
                is_cancelled: false,
            },
        );
        match_id
    }

    /// Records (or corrects) a final score.
    pub fn set_result(&self, match_id: Uuid, home: i32, away: i32) {
        if let Some(m) = self.inner().matches.get_mut(&match_id) {
            m.home_score = Some(home);
            m.away_score = Some(away);
        }
    }

    pub fn cancel_match(&self, match_id: Uuid) {
        if let Some(m) = self.inner().matches.get_mut(&match_id) {
            m.is_cancelled = true;
        }
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.inner().users.insert(
            user_id,
            User {
                user_id,
                username: username.to_string(),
            },
        );
        user_id
    }

    pub fn add_bet(&self, user_id: Uuid, match_id: Uuid, home: i32, away: i32) -> Uuid {
        let bet_id = Uuid::new_v4();
        self.inner().bets.insert(
            bet_id,
            Bet {
                bet_id,
                user_id,
                match_id,
                home_prediction: home,
                away_prediction: away,
                points_earned: 0,
            },
        );
        bet_id
    }

    pub fn bet(&self, bet_id: Uuid) -> Option<Bet> {
        self.inner().bets.get(&bet_id).cloned()
    }

    pub fn performance(&self, league_id: Uuid, user_id: Uuid) -> Option<UserLeaguePerformance> {
        self.inner().performance.get(&(league_id, user_id)).cloned()
    }

    pub fn trend(&self, user_id: Uuid, date: NaiveDate) -> Option<UserBettingTrend> {
        self.inner().trends.get(&(user_id, date)).cloned()
    }

    pub fn reports(&self) -> Vec<LeagueReportRecord> {
        self.inner().reports.clone()
    }

    /// Makes every trend write for `user_id` fail as if the store timed out.
    #[cfg(any(test, feature = "testing"))]
    pub fn fail_trend_writes_for(&self, user_id: Uuid) {
        self.inner().faults.trend_users.insert(user_id);
    }

    /// Lets `batches` point writes through, then fails the rest.
    #[cfg(any(test, feature = "testing"))]
    pub fn fail_point_writes_after(&self, batches: usize) {
        self.inner().faults.point_writes_left = Some(batches);
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn clear_faults(&self) {
        self.inner().faults = Faults::default();
    }

    fn league_lock(&self, league_id: Uuid) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(league_id)
            .or_default()
            .clone()
    }
}

#[async_trait::async_trait]
impl FixtureStore for MemoryStore {
    async fn league_exists(&self, league_id: Uuid) -> Result<bool> {
        Ok(self.inner().leagues.contains_key(&league_id))
    }

    async fn list_league_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.inner().leagues.keys().copied().collect())
    }

    async fn league_matches(&self, league_id: Uuid, page: PageRequest) -> Result<Vec<Match>> {
        let inner = self.inner();
        Ok(inner
            .matches
            .values()
            .filter(|m| after(&page, &m.match_id))
            .filter(|m| inner.match_in_league(m.match_id, league_id))
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl BetLedger for MemoryStore {
    async fn bets_for_match(&self, match_id: Uuid, page: PageRequest) -> Result<Vec<Bet>> {
        Ok(self
            .inner()
            .bets
            .values()
            .filter(|b| b.match_id == match_id && after(&page, &b.bet_id))
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn set_points(&self, updates: &[PointsUpdate]) -> Result<u64> {
        let mut inner = self.inner();
        if let Some(left) = inner.faults.point_writes_left.as_mut() {
            if *left == 0 {
                return Err(unavailable());
            }
            *left -= 1;
        }

        let mut written = 0;
        for update in updates {
            if let Some(bet) = inner.bets.get_mut(&update.bet_id) {
                bet.points_earned = update.points;
                written += 1;
            }
        }
        Ok(written)
    }

    async fn league_totals(&self, league_id: Uuid) -> Result<Vec<UserLeagueTotals>> {
        let inner = self.inner();
        let mut totals: BTreeMap<Uuid, UserLeagueTotals> = BTreeMap::new();

        for bet in inner.bets.values() {
            if !inner.match_in_league(bet.match_id, league_id) {
                continue;
            }
            let entry = totals.entry(bet.user_id).or_insert(UserLeagueTotals {
                user_id: bet.user_id,
                total_bets: 0,
                correct_bets: 0,
                total_points: 0,
            });
            entry.total_bets += 1;
            if bet.is_correct() {
                entry.correct_bets += 1;
            }
            entry.total_points += i64::from(bet.points_earned);
        }

        Ok(totals.into_values().collect())
    }

    async fn user_bets_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScoredBet>> {
        let inner = self.inner();
        let mut bets: Vec<ScoredBet> = inner
            .bets
            .values()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| inner.scored(b))
            .filter(|b| b.match_date >= from && b.match_date < to)
            .collect();
        bets.sort_by_key(|b| (b.match_date, b.bet_id));
        Ok(bets)
    }

    async fn league_scored_bets(
        &self,
        league_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ScoredBet>> {
        let inner = self.inner();
        Ok(inner
            .bets
            .values()
            .filter(|b| after(&page, &b.bet_id))
            .filter(|b| inner.match_in_league(b.match_id, league_id))
            .filter_map(|b| inner.scored(b))
            .take(page.limit as usize)
            .collect())
    }

    async fn list_user_ids(&self, page: PageRequest) -> Result<Vec<Uuid>> {
        Ok(self
            .inner()
            .users
            .keys()
            .filter(|id| after(&page, id))
            .take(page.limit as usize)
            .copied()
            .collect())
    }
}

#[async_trait::async_trait]
impl AggregateStore for MemoryStore {
    async fn replace_league_performance(
        &self,
        league_id: Uuid,
        totals: &[UserLeagueTotals],
    ) -> Result<ReplaceOutcome> {
        let mut inner = self.inner();
        let now = Utc::now();
        let mut outcome = ReplaceOutcome::default();

        for t in totals {
            let username = inner
                .users
                .get(&t.user_id)
                .map(|u| u.username.clone())
                .ok_or_else(|| {
                    StorageError::ConstraintViolation(format!("unknown user {}", t.user_id))
                })?;
            let rank = inner
                .performance
                .get(&(league_id, t.user_id))
                .map_or(0, |p| p.rank);
            inner.performance.insert(
                (league_id, t.user_id),
                UserLeaguePerformance {
                    user_id: t.user_id,
                    league_id,
                    username,
                    total_bets: t.total_bets,
                    correct_bets: t.correct_bets,
                    total_points: t.total_points,
                    rank,
                    updated_at: now,
                },
            );
            outcome.upserted += 1;
        }

        let keep: HashSet<Uuid> = totals.iter().map(|t| t.user_id).collect();
        let before = inner.performance.len();
        inner
            .performance
            .retain(|(league, user), _| *league != league_id || keep.contains(user));
        outcome.removed = (before - inner.performance.len()) as u64;

        Ok(outcome)
    }

    async fn league_performance(&self, league_id: Uuid) -> Result<Vec<UserLeaguePerformance>> {
        Ok(self
            .inner()
            .performance
            .values()
            .filter(|p| p.league_id == league_id)
            .cloned()
            .collect())
    }

    async fn store_ranks(&self, league_id: Uuid, ranks: &[RankUpdate]) -> Result<()> {
        let mut inner = self.inner();
        for update in ranks {
            if let Some(row) = inner.performance.get_mut(&(league_id, update.user_id)) {
                row.rank = update.rank;
            }
        }
        Ok(())
    }

    async fn upsert_trend(&self, totals: &DailyTotals) -> Result<UserBettingTrend> {
        let mut inner = self.inner();
        if inner.faults.trend_users.contains(&totals.user_id) {
            return Err(unavailable());
        }

        let trend = UserBettingTrend {
            user_id: totals.user_id,
            trend_date: totals.date,
            total_bets: totals.total_bets,
            correct_bets: totals.correct_bets,
            total_points: totals.total_points,
            updated_at: Utc::now(),
        };
        inner
            .trends
            .insert((totals.user_id, totals.date), trend.clone());
        Ok(trend)
    }

    async fn user_trends_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<UserBettingTrend>> {
        Ok(self
            .inner()
            .trends
            .range((user_id, since)..=(user_id, NaiveDate::MAX))
            .rev()
            .map(|(_, trend)| trend.clone())
            .collect())
    }

    async fn insert_report(
        &self,
        league_id: Uuid,
        report_type: &str,
        data: &serde_json::Value,
    ) -> Result<LeagueReportRecord> {
        let report = LeagueReportRecord {
            report_id: Uuid::new_v4(),
            league_id,
            report_type: report_type.to_string(),
            data: data.clone(),
            created_at: Utc::now(),
        };
        self.inner().reports.push(report.clone());
        Ok(report)
    }
}

#[async_trait::async_trait]
impl LeagueLocks for MemoryStore {
    type Guard = OwnedMutexGuard<()>;

    async fn lock(&self, league_id: Uuid) -> Result<Self::Guard> {
        Ok(self.league_lock(league_id).lock_owned().await)
    }
}
