use std::cmp::Ordering;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::dto::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::dto::ledger::RankUpdate;
use crate::error::{EngineError, PassStage};
use crate::models::UserLeaguePerformance;
use crate::traits::EngineStore;

use super::recomputation::ensure_league;

/// Ranks the league's users and writes the ranks back.
///
/// Expects a recomputation pass to have run; the per-league lock keeps the
/// build from reading totals while one is in progress.
#[tracing::instrument(skip_all, fields(league = %league_id))]
pub async fn build_leaderboard<S>(store: &S, league_id: Uuid) -> Result<Leaderboard, EngineError>
where
    S: EngineStore + ?Sized,
{
    ensure_league(store, league_id).await?;

    let _guard = store
        .lock(league_id)
        .await
        .map_err(EngineError::league(league_id, PassStage::Locking))?;

    let rows = store
        .league_performance(league_id)
        .await
        .map_err(EngineError::league(league_id, PassStage::Ranking))?;

    let entries = rank_performances(rows);

    let ranks: Vec<RankUpdate> = entries
        .iter()
        .map(|entry| RankUpdate {
            user_id: entry.user_id,
            rank: entry.rank,
        })
        .collect();

    store
        .store_ranks(league_id, &ranks)
        .await
        .map_err(EngineError::league(league_id, PassStage::Ranking))?;

    info!(entries = entries.len(), "Leaderboard built");

    Ok(Leaderboard {
        league_id,
        generated_at: Utc::now(),
        entries,
    })
}

/// Orders rows into a leaderboard with ranks `1..=N`.
///
/// Points descending, then accuracy descending, then username and user id
/// ascending. The last key is unique, so no two rows ever compare equal.
pub fn rank_performances(mut rows: Vec<UserLeaguePerformance>) -> Vec<LeaderboardEntry> {
    rows.sort_by(compare_standing);

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: index as i32 + 1,
            accuracy: accuracy(row.correct_bets, row.total_bets),
            user_id: row.user_id,
            username: row.username,
            total_points: row.total_points,
            total_bets: row.total_bets,
            correct_bets: row.correct_bets,
        })
        .collect()
}

fn compare_standing(a: &UserLeaguePerformance, b: &UserLeaguePerformance) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| compare_accuracy(b, a))
        .then_with(|| a.username.cmp(&b.username))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Compares `correct / total` exactly by cross-multiplying. No bets counts
/// as zero accuracy.
fn compare_accuracy(a: &UserLeaguePerformance, b: &UserLeaguePerformance) -> Ordering {
    let (a_num, a_den) = ratio(a);
    let (b_num, b_den) = ratio(b);
    (a_num * b_den).cmp(&(b_num * a_den))
}

fn ratio(row: &UserLeaguePerformance) -> (i128, i128) {
    if row.total_bets <= 0 {
        (0, 1)
    } else {
        (i128::from(row.correct_bets), i128::from(row.total_bets))
    }
}

fn accuracy(correct_bets: i64, total_bets: i64) -> Decimal {
    if total_bets <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(correct_bets) / Decimal::from(total_bets)).round_dp(4)
}
