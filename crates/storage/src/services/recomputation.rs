use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::PointsUpdate;
use crate::dto::recompute::RecomputeResult;
use crate::error::{EngineError, PassStage, Result as StorageResult};
use crate::models::{Bet, Match};
use crate::settings::EngineSettings;
use crate::traits::EngineStore;

use super::scoring::score;

/// Why a single bet was left out of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    NegativePrediction,
    NegativeResult,
    ForeignMatch,
}

impl SkipReason {
    /// Malformed input earns nothing, so any points left from an earlier pass
    /// are cleared. A foreign bet is left for its own match to score.
    fn clears_points(self) -> bool {
        !matches!(self, Self::ForeignMatch)
    }
}

/// Re-scores every bet in the league and rebuilds its per-user totals.
///
/// Points are overwritten, never incremented, and the totals are summed
/// afresh from the ledger once all bets are written. Running the pass again
/// on unchanged data changes nothing; running it after a result correction
/// yields the corrected totals. A failure midway leaves finished pages in
/// place for the next run to overwrite.
#[tracing::instrument(skip_all, fields(league = %league_id))]
pub async fn recompute<S>(
    store: &S,
    settings: &EngineSettings,
    league_id: Uuid,
) -> Result<RecomputeResult, EngineError>
where
    S: EngineStore + ?Sized,
{
    ensure_league(store, league_id).await?;

    let _guard = store
        .lock(league_id)
        .await
        .map_err(EngineError::league(league_id, PassStage::Locking))?;

    let mut result = RecomputeResult::new(league_id);

    score_league(store, settings, league_id, &mut result)
        .await
        .map_err(EngineError::league(league_id, PassStage::Scoring))?;

    let totals = store
        .league_totals(league_id)
        .await
        .map_err(EngineError::league(league_id, PassStage::Aggregation))?;

    let outcome = store
        .replace_league_performance(league_id, &totals)
        .await
        .map_err(EngineError::league(league_id, PassStage::Aggregation))?;

    result.users_updated = outcome.upserted;
    result.stale_rows_removed = outcome.removed;

    info!(
        matches = result.matches_scanned,
        bets_updated = result.bets_updated,
        bets_skipped = result.bets_skipped,
        bets_reset = result.bets_reset,
        users_updated = result.users_updated,
        stale_rows_removed = result.stale_rows_removed,
        "League recomputation complete"
    );

    Ok(result)
}

pub(crate) async fn ensure_league<S>(store: &S, league_id: Uuid) -> Result<(), EngineError>
where
    S: EngineStore + ?Sized,
{
    let exists = store
        .league_exists(league_id)
        .await
        .map_err(EngineError::league(league_id, PassStage::Lookup))?;

    if exists {
        Ok(())
    } else {
        Err(EngineError::LeagueNotFound(league_id))
    }
}

async fn score_league<S>(
    store: &S,
    settings: &EngineSettings,
    league_id: Uuid,
    result: &mut RecomputeResult,
) -> StorageResult<()>
where
    S: EngineStore + ?Sized,
{
    let mut page = PageRequest::first(settings.page_size);

    loop {
        let matches = store.league_matches(league_id, page).await?;
        let Some(last) = matches.last() else {
            break;
        };
        let next = page.next(last.match_id);

        for fixture in &matches {
            score_match(store, settings, fixture, result).await?;
        }

        debug!(matches = matches.len(), "Scored page of matches");

        if page.is_last(matches.len()) {
            break;
        }
        page = next;
    }

    Ok(())
}

async fn score_match<S>(
    store: &S,
    settings: &EngineSettings,
    fixture: &Match,
    result: &mut RecomputeResult,
) -> StorageResult<()>
where
    S: EngineStore + ?Sized,
{
    let mut page = PageRequest::first(settings.page_size);

    loop {
        let bets = store.bets_for_match(fixture.match_id, page).await?;
        let Some(last) = bets.last() else {
            break;
        };
        let next = page.next(last.bet_id);

        let mut updates = Vec::with_capacity(bets.len());
        let mut resets = Vec::new();
        for bet in &bets {
            match evaluate(bet, fixture) {
                Ok(update) => updates.push(update),
                Err(reason) => {
                    report_skip(bet, fixture, reason);
                    result.bets_skipped += 1;
                    if reason.clears_points() && bet.points_earned != 0 {
                        resets.push(PointsUpdate {
                            bet_id: bet.bet_id,
                            points: 0,
                        });
                    }
                }
            }
        }

        if !updates.is_empty() {
            result.bets_updated += store.set_points(&updates).await?;
        }
        if !resets.is_empty() {
            result.bets_reset += store.set_points(&resets).await?;
        }

        if page.is_last(bets.len()) {
            break;
        }
        page = next;
    }

    result.matches_scanned += 1;
    Ok(())
}

fn evaluate(bet: &Bet, fixture: &Match) -> Result<PointsUpdate, SkipReason> {
    if bet.match_id != fixture.match_id {
        return Err(SkipReason::ForeignMatch);
    }

    let prediction = bet.prediction();
    if !prediction.is_valid() {
        return Err(SkipReason::NegativePrediction);
    }

    let actual = fixture.result();
    if !actual.is_valid() {
        return Err(SkipReason::NegativeResult);
    }

    Ok(PointsUpdate {
        bet_id: bet.bet_id,
        points: score(prediction, actual),
    })
}

fn report_skip(bet: &Bet, fixture: &Match, reason: SkipReason) {
    match reason {
        SkipReason::NegativePrediction => warn!(
            bet_id = %bet.bet_id,
            home = bet.home_prediction,
            away = bet.away_prediction,
            "Skipping bet with negative prediction"
        ),
        SkipReason::NegativeResult => warn!(
            bet_id = %bet.bet_id,
            match_id = %fixture.match_id,
            home = ?fixture.home_score,
            away = ?fixture.away_score,
            "Skipping bet on match with negative score"
        ),
        SkipReason::ForeignMatch => error!(
            bet_id = %bet.bet_id,
            bet_match = %bet.match_id,
            scored_match = %fixture.match_id,
            "Bet does not belong to the match being scored, skipping"
        ),
    }
}
