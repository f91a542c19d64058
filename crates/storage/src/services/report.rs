use std::collections::BTreeMap;

use chrono::FixedOffset;
use tracing::info;
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::ScoredBet;
use crate::dto::report::{
    BetDistribution, LeagueReportData, MonthlyParticipation, PointsBucket, TopPerformer,
};
use crate::error::{EngineError, PassStage, Result as StorageResult, StorageError};
use crate::models::LeagueReportRecord;
use crate::settings::EngineSettings;
use crate::traits::EngineStore;

use super::leaderboard::rank_performances;
use super::recomputation::ensure_league;
use super::scoring::MAX_POINTS;

pub const TOP_PERFORMERS: usize = 10;

/// Builds a league report from current data and appends it to the store.
///
/// Read-only with respect to bets and standings, so no league lock is taken.
#[tracing::instrument(skip_all, fields(league = %league_id, %report_type))]
pub async fn generate_league_report<S>(
    store: &S,
    settings: &EngineSettings,
    league_id: Uuid,
    report_type: &str,
) -> Result<LeagueReportRecord, EngineError>
where
    S: EngineStore + ?Sized,
{
    ensure_league(store, league_id).await?;

    let data = collect_report(store, settings, league_id)
        .await
        .map_err(EngineError::league(league_id, PassStage::Reporting))?;

    let value = serde_json::to_value(&data)
        .map_err(StorageError::from)
        .map_err(EngineError::league(league_id, PassStage::Reporting))?;

    let report = store
        .insert_report(league_id, report_type, &value)
        .await
        .map_err(EngineError::league(league_id, PassStage::Reporting))?;

    info!(
        report_id = %report.report_id,
        participants = data.total_participants,
        bets = data.bet_distribution.total_bets,
        "League report stored"
    );

    Ok(report)
}

async fn collect_report<S>(
    store: &S,
    settings: &EngineSettings,
    league_id: Uuid,
) -> StorageResult<LeagueReportData>
where
    S: EngineStore + ?Sized,
{
    let participants = store.league_totals(league_id).await?;

    let top_performers = rank_performances(store.league_performance(league_id).await?)
        .into_iter()
        .take(TOP_PERFORMERS)
        .map(TopPerformer::from)
        .collect();

    let mut tally = BetTally::new(settings.trend_offset());
    let mut page = PageRequest::first(settings.page_size);
    loop {
        let bets = store.league_scored_bets(league_id, page).await?;
        let Some(last) = bets.last() else {
            break;
        };
        let next = page.next(last.bet_id);

        bets.iter().for_each(|bet| tally.add(bet));

        if page.is_last(bets.len()) {
            break;
        }
        page = next;
    }

    let (bet_distribution, participation_by_month) = tally.finish();

    Ok(LeagueReportData {
        league_id,
        total_participants: participants.len() as u64,
        top_performers,
        bet_distribution,
        participation_by_month,
    })
}

/// Running counts over a league's bets, fed one page at a time.
struct BetTally {
    offset: FixedOffset,
    distribution: BetDistribution,
    by_points: BTreeMap<i32, u64>,
    by_month: BTreeMap<String, (u64, i64)>,
}

impl BetTally {
    fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            distribution: BetDistribution::default(),
            by_points: BTreeMap::new(),
            by_month: BTreeMap::new(),
        }
    }

    fn add(&mut self, bet: &ScoredBet) {
        self.distribution.total_bets += 1;
        if bet.points_earned > 0 {
            self.distribution.correct_bets += 1;
        }
        if bet.points_earned == MAX_POINTS {
            self.distribution.perfect_bets += 1;
        }
        *self.by_points.entry(bet.points_earned).or_default() += 1;

        let month = bet
            .match_date
            .with_timezone(&self.offset)
            .format("%Y-%m")
            .to_string();
        let slot = self.by_month.entry(month).or_default();
        slot.0 += 1;
        slot.1 += i64::from(bet.points_earned);
    }

    fn finish(self) -> (BetDistribution, Vec<MonthlyParticipation>) {
        let mut distribution = self.distribution;
        distribution.by_points = self
            .by_points
            .into_iter()
            .map(|(points, count)| PointsBucket { points, count })
            .collect();

        let months = self
            .by_month
            .into_iter()
            .map(|(month, (total_bets, total_points))| MonthlyParticipation {
                month,
                total_bets,
                total_points,
            })
            .collect();

        (distribution, months)
    }
}
