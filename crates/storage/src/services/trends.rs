use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::DailyTotals;
use crate::dto::trend::{TrendBatchReport, TrendFailure};
use crate::error::{EngineError, Result as StorageResult};
use crate::models::UserBettingTrend;
use crate::settings::EngineSettings;
use crate::traits::EngineStore;

/// UTC bounds `[start, end)` of a calendar day in the given offset.
///
/// `None` when either bound falls outside the representable range.
pub fn day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let local_midnight = date.and_time(NaiveTime::default());
    let utc_midnight = local_midnight
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
    let start = DateTime::<Utc>::from_naive_utc_and_offset(utc_midnight, Utc);
    let end = start.checked_add_signed(TimeDelta::days(1))?;
    Some((start, end))
}

/// Recomputes and upserts one user's snapshot for `date`.
///
/// Counts every bet on a match kicking off that day; re-running overwrites
/// the stored row with fresh values.
pub async fn update_daily_trend<S>(
    store: &S,
    settings: &EngineSettings,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<UserBettingTrend, EngineError>
where
    S: EngineStore + ?Sized,
{
    let at_trend = |source| EngineError::Trend {
        user_id,
        date,
        source,
    };

    let (from, to) =
        day_bounds(date, settings.trend_offset()).ok_or(EngineError::DateOutOfRange(date))?;
    let bets = store
        .user_bets_between(user_id, from, to)
        .await
        .map_err(at_trend)?;

    let totals = DailyTotals::from_bets(user_id, date, &bets);
    let trend = store.upsert_trend(&totals).await.map_err(at_trend)?;

    debug!(
        %user_id,
        %date,
        total_bets = trend.total_bets,
        total_points = trend.total_points,
        "Updated daily trend"
    );

    Ok(trend)
}

/// Runs [`update_daily_trend`] for every user.
///
/// A failing user is recorded in the report and the run moves on. Only a
/// failure to list users aborts the batch.
#[tracing::instrument(skip_all, fields(%date))]
pub async fn update_all_daily_trends<S>(
    store: &S,
    settings: &EngineSettings,
    date: NaiveDate,
) -> Result<TrendBatchReport, EngineError>
where
    S: EngineStore + ?Sized,
{
    if day_bounds(date, settings.trend_offset()).is_none() {
        return Err(EngineError::DateOutOfRange(date));
    }

    let mut report = TrendBatchReport::new(date);
    let mut page = PageRequest::first(settings.page_size);

    loop {
        let user_ids = store
            .list_user_ids(page)
            .await
            .map_err(|source| EngineError::UserEnumeration { date, source })?;
        let Some(&last) = user_ids.last() else {
            break;
        };

        for &user_id in &user_ids {
            report.users_processed += 1;
            match update_daily_trend(store, settings, user_id, date).await {
                Ok(_) => report.snapshots_written += 1,
                Err(e) => {
                    warn!(%user_id, error = %e, "Daily trend update failed");
                    report.failures.push(TrendFailure {
                        user_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if page.is_last(user_ids.len()) {
            break;
        }
        page = page.next(last);
    }

    info!(
        users = report.users_processed,
        written = report.snapshots_written,
        failed = report.failures.len(),
        "Daily trends updated"
    );

    Ok(report)
}

/// Stored snapshots from the last `days` days up to `today`, newest first.
pub async fn recent_trends<S>(
    store: &S,
    user_id: Uuid,
    days: u32,
    today: NaiveDate,
) -> StorageResult<Vec<UserBettingTrend>>
where
    S: EngineStore + ?Sized,
{
    let since = today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    store.user_trends_since(user_id, since).await
}
