use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use storage::dto::ledger::PointsUpdate;
use storage::dto::report::LeagueReportData;
use storage::memory::MemoryStore;
use storage::services::{
    build_leaderboard, generate_league_report, recent_trends, recompute, update_all_daily_trends,
    update_daily_trend,
};
use storage::traits::{BetLedger, LeagueLocks};
use storage::{EngineError, EngineSettings, PassStage};
use uuid::Uuid;

/// One league, one competition, one round with a decided and an open match.
struct Season {
    store: MemoryStore,
    league: Uuid,
    competition: Uuid,
    decided: Uuid,
    open: Uuid,
    alice: Uuid,
    bob: Uuid,
}

fn kickoff(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 18, 0, 0).unwrap()
}

fn season() -> Season {
    let store = MemoryStore::new();
    let league = store.add_league("Friends Cup", "2025");
    let competition = store.add_competition("Premier", &[league]);
    let round = store.add_round(competition, "Matchday 1");

    let decided = store.add_match(round, kickoff(14));
    store.set_result(decided, 2, 1);
    let open = store.add_match(round, kickoff(15));

    let alice = store.add_user("alice");
    let bob = store.add_user("bob");

    store.add_bet(alice, decided, 2, 1);
    store.add_bet(alice, open, 1, 1);
    store.add_bet(bob, decided, 1, 0);

    Season {
        store,
        league,
        competition,
        decided,
        open,
        alice,
        bob,
    }
}

fn small_pages() -> EngineSettings {
    EngineSettings {
        page_size: 1,
        ..EngineSettings::default()
    }
}

#[tokio::test]
async fn test_recompute_scores_bets_and_totals() {
    let s = season();

    let result = recompute(&s.store, &EngineSettings::default(), s.league)
        .await
        .unwrap();

    assert_eq!(result.matches_scanned, 2);
    assert_eq!(result.bets_updated, 3);
    assert_eq!(result.bets_skipped, 0);
    assert_eq!(result.users_updated, 2);

    let alice = s.store.performance(s.league, s.alice).unwrap();
    assert_eq!(alice.total_bets, 2);
    assert_eq!(alice.correct_bets, 1);
    assert_eq!(alice.total_points, 17);

    let bob = s.store.performance(s.league, s.bob).unwrap();
    assert_eq!(bob.total_bets, 1);
    assert_eq!(bob.correct_bets, 1);
    assert_eq!(bob.total_points, 5);
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let s = season();
    let settings = small_pages();

    recompute(&s.store, &settings, s.league).await.unwrap();
    let first = s.store.performance(s.league, s.alice).unwrap();

    let again = recompute(&s.store, &settings, s.league).await.unwrap();
    let second = s.store.performance(s.league, s.alice).unwrap();

    assert_eq!(again.stale_rows_removed, 0);
    assert_eq!(first.total_bets, second.total_bets);
    assert_eq!(first.correct_bets, second.correct_bets);
    assert_eq!(first.total_points, second.total_points);
}

#[tokio::test]
async fn test_recompute_after_result_correction() {
    let s = season();
    let settings = EngineSettings::default();
    recompute(&s.store, &settings, s.league).await.unwrap();

    s.store.set_result(s.decided, 1, 0);
    recompute(&s.store, &settings, s.league).await.unwrap();

    assert_eq!(s.store.performance(s.league, s.alice).unwrap().total_points, 5);
    assert_eq!(s.store.performance(s.league, s.bob).unwrap().total_points, 17);
}

#[tokio::test]
async fn test_cancelled_match_resets_points() {
    let s = season();
    let settings = EngineSettings::default();
    recompute(&s.store, &settings, s.league).await.unwrap();

    s.store.cancel_match(s.decided);
    recompute(&s.store, &settings, s.league).await.unwrap();

    let alice = s.store.performance(s.league, s.alice).unwrap();
    assert_eq!(alice.total_bets, 2);
    assert_eq!(alice.correct_bets, 0);
    assert_eq!(alice.total_points, 0);
}

#[tokio::test]
async fn test_recompute_skips_negative_predictions() {
    let s = season();
    let carol = s.store.add_user("carol");
    let bad = s.store.add_bet(carol, s.decided, -1, 0);

    let result = recompute(&s.store, &EngineSettings::default(), s.league)
        .await
        .unwrap();

    assert_eq!(result.bets_skipped, 1);
    assert_eq!(result.bets_updated, 3);
    assert_eq!(s.store.bet(bad).unwrap().points_earned, 0);

    let carol_row = s.store.performance(s.league, carol).unwrap();
    assert_eq!(carol_row.total_bets, 1);
    assert_eq!(carol_row.total_points, 0);
}

#[tokio::test]
async fn test_malformed_bet_drops_stale_points() {
    let s = season();
    let carol = s.store.add_user("carol");
    let bad = s.store.add_bet(carol, s.decided, -1, 0);
    s.store
        .set_points(&[PointsUpdate {
            bet_id: bad,
            points: 9,
        }])
        .await
        .unwrap();

    let result = recompute(&s.store, &EngineSettings::default(), s.league)
        .await
        .unwrap();

    assert_eq!(result.bets_skipped, 1);
    assert_eq!(result.bets_reset, 1);
    assert_eq!(result.bets_updated, 3);
    assert_eq!(s.store.bet(bad).unwrap().points_earned, 0);

    let carol_row = s.store.performance(s.league, carol).unwrap();
    assert_eq!(carol_row.total_bets, 1);
    assert_eq!(carol_row.correct_bets, 0);
    assert_eq!(carol_row.total_points, 0);
}

#[tokio::test]
async fn test_negative_result_skips_and_clears_bets() {
    let s = season();
    let settings = EngineSettings::default();
    recompute(&s.store, &settings, s.league).await.unwrap();
    assert_eq!(s.store.performance(s.league, s.alice).unwrap().total_points, 17);

    s.store.set_result(s.decided, -1, 0);
    let result = recompute(&s.store, &settings, s.league).await.unwrap();

    assert_eq!(result.bets_skipped, 2);
    assert_eq!(result.bets_reset, 2);
    assert_eq!(result.bets_updated, 1);

    let alice = s.store.performance(s.league, s.alice).unwrap();
    assert_eq!(alice.total_bets, 2);
    assert_eq!(alice.correct_bets, 0);
    assert_eq!(alice.total_points, 0);
    assert_eq!(s.store.performance(s.league, s.bob).unwrap().total_points, 0);
}

#[tokio::test]
async fn test_recompute_unknown_league() {
    let s = season();
    let missing = Uuid::new_v4();

    let err = recompute(&s.store, &EngineSettings::default(), missing)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::LeagueNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_recompute_removes_stale_rows() {
    let s = season();
    let settings = EngineSettings::default();
    recompute(&s.store, &settings, s.league).await.unwrap();

    s.store.unlink_competition(s.competition, s.league);
    let result = recompute(&s.store, &settings, s.league).await.unwrap();

    assert_eq!(result.matches_scanned, 0);
    assert_eq!(result.stale_rows_removed, 2);
    assert!(s.store.performance(s.league, s.alice).is_none());
}

#[tokio::test]
async fn test_shared_competition_counts_in_each_league() {
    let s = season();
    let other = s.store.add_league("Office Pool", "2025");
    s.store.link_competition(s.competition, other);
    let settings = EngineSettings::default();

    recompute(&s.store, &settings, s.league).await.unwrap();
    let result = recompute(&s.store, &settings, other).await.unwrap();

    assert_eq!(result.matches_scanned, 2);
    let home = s.store.performance(s.league, s.alice).unwrap();
    let away = s.store.performance(other, s.alice).unwrap();
    assert_eq!(home.total_points, away.total_points);
    assert_eq!(away.total_bets, 2);
}

#[tokio::test]
async fn test_failed_pass_is_repaired_by_rerun() {
    let s = season();
    let settings = small_pages();

    s.store.fail_point_writes_after(1);
    let err = recompute(&s.store, &settings, s.league).await.unwrap_err();
    assert_eq!(err.stage(), PassStage::Scoring);
    assert!(s.store.performance(s.league, s.alice).is_none());

    s.store.clear_faults();
    recompute(&s.store, &settings, s.league).await.unwrap();

    assert_eq!(s.store.performance(s.league, s.alice).unwrap().total_points, 17);
    assert_eq!(s.store.performance(s.league, s.bob).unwrap().total_points, 5);
}

#[tokio::test]
async fn test_leaderboard_ranks_after_recompute() {
    let s = season();
    recompute(&s.store, &EngineSettings::default(), s.league)
        .await
        .unwrap();

    let board = build_leaderboard(&s.store, s.league).await.unwrap();

    assert_eq!(board.entries.len(), 2);
    assert_eq!(board.entries[0].user_id, s.alice);
    assert_eq!(board.entries[0].rank, 1);
    assert_eq!(board.entries[1].user_id, s.bob);
    assert_eq!(board.entries[1].rank, 2);

    assert_eq!(s.store.performance(s.league, s.alice).unwrap().rank, 1);
    assert_eq!(s.store.performance(s.league, s.bob).unwrap().rank, 2);
}

#[tokio::test]
async fn test_leaderboard_for_empty_league() {
    let store = MemoryStore::new();
    let league = store.add_league("Empty", "2025");

    let board = build_leaderboard(&store, league).await.unwrap();
    assert!(board.entries.is_empty());
}

#[tokio::test]
async fn test_passes_wait_for_league_lock() {
    let s = season();
    let settings = EngineSettings::default();

    let guard = s.store.lock(s.league).await.unwrap();
    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        recompute(&s.store, &settings, s.league),
    )
    .await;
    assert!(blocked.is_err());

    drop(guard);
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        recompute(&s.store, &settings, s.league),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(result.users_updated, 2);
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

#[tokio::test]
async fn test_daily_trend_upsert_is_idempotent() {
    let s = season();
    let settings = EngineSettings::default();
    recompute(&s.store, &settings, s.league).await.unwrap();

    let first = update_daily_trend(&s.store, &settings, s.alice, march(14))
        .await
        .unwrap();
    let second = update_daily_trend(&s.store, &settings, s.alice, march(14))
        .await
        .unwrap();

    assert_eq!(first.total_bets, 1);
    assert_eq!(first.correct_bets, 1);
    assert_eq!(first.total_points, 17);
    assert_eq!(second.total_points, first.total_points);
    assert_eq!(s.store.trend(s.alice, march(14)).unwrap().total_points, 17);
}

#[tokio::test]
async fn test_daily_trend_for_quiet_day_is_zero() {
    let s = season();
    let trend = update_daily_trend(&s.store, &EngineSettings::default(), s.bob, march(20))
        .await
        .unwrap();

    assert_eq!(trend.total_bets, 0);
    assert_eq!(trend.total_points, 0);
}

#[tokio::test]
async fn test_daily_trend_uses_configured_offset() {
    let s = season();
    let settings = EngineSettings {
        trend_utc_offset_minutes: 8 * 60,
        ..EngineSettings::default()
    };
    recompute(&s.store, &settings, s.league).await.unwrap();

    // 18:00 UTC on the 14th is 02:00 on the 15th at UTC+8.
    let on_14th = update_daily_trend(&s.store, &settings, s.alice, march(14))
        .await
        .unwrap();
    let on_15th = update_daily_trend(&s.store, &settings, s.alice, march(15))
        .await
        .unwrap();

    assert_eq!(on_14th.total_bets, 0);
    assert_eq!(on_15th.total_bets, 1);
    assert_eq!(on_15th.total_points, 17);
}

#[tokio::test]
async fn test_trend_batch_continues_past_failures() {
    let s = season();
    let settings = small_pages();
    recompute(&s.store, &settings, s.league).await.unwrap();
    s.store.fail_trend_writes_for(s.bob);

    let report = update_all_daily_trends(&s.store, &settings, march(14))
        .await
        .unwrap();

    assert_eq!(report.users_processed, 2);
    assert_eq!(report.snapshots_written, 1);
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, s.bob);
    assert!(s.store.trend(s.alice, march(14)).is_some());
    assert!(s.store.trend(s.bob, march(14)).is_none());
}

#[tokio::test]
async fn test_recent_trends_newest_first_within_window() {
    let s = season();
    let settings = EngineSettings::default();
    let today = march(28);

    for back in [0, 3, 10] {
        let date = today.checked_sub_days(Days::new(back)).unwrap();
        update_daily_trend(&s.store, &settings, s.alice, date)
            .await
            .unwrap();
    }

    let trends = recent_trends(&s.store, s.alice, 7, today).await.unwrap();
    let dates: Vec<NaiveDate> = trends.iter().map(|t| t.trend_date).collect();
    assert_eq!(dates, vec![march(28), march(25)]);
}

#[tokio::test]
async fn test_league_report_contents() {
    let s = season();
    let settings = EngineSettings::default();
    recompute(&s.store, &settings, s.league).await.unwrap();
    build_leaderboard(&s.store, s.league).await.unwrap();

    let record = generate_league_report(&s.store, &settings, s.league, "monthly")
        .await
        .unwrap();

    assert_eq!(record.report_type, "monthly");
    assert_eq!(s.store.reports().len(), 1);

    let data: LeagueReportData = serde_json::from_value(record.data).unwrap();
    assert_eq!(data.total_participants, 2);
    assert_eq!(data.top_performers.len(), 2);
    assert_eq!(data.top_performers[0].username, "alice");
    assert_eq!(data.bet_distribution.total_bets, 3);
    assert_eq!(data.bet_distribution.correct_bets, 2);
    assert_eq!(data.bet_distribution.perfect_bets, 1);
    assert_eq!(data.participation_by_month.len(), 1);
    assert_eq!(data.participation_by_month[0].month, "2025-03");
    assert_eq!(data.participation_by_month[0].total_points, 22);
}

#[tokio::test]
async fn test_report_for_unknown_league() {
    let store = MemoryStore::new();
    let err = generate_league_report(&store, &EngineSettings::default(), Uuid::new_v4(), "monthly")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::LeagueNotFound(_)));
    assert!(store.reports().is_empty());
}

#[tokio::test]
async fn test_stale_points_on_open_match_are_reset() {
    let s = season();
    let bet = s.store.add_bet(s.bob, s.open, 0, 0);
    s.store
        .set_points(&[PointsUpdate {
            bet_id: bet,
            points: 9,
        }])
        .await
        .unwrap();

    recompute(&s.store, &EngineSettings::default(), s.league)
        .await
        .unwrap();

    assert_eq!(s.store.bet(bet).unwrap().points_earned, 0);
    assert_eq!(s.store.performance(s.league, s.bob).unwrap().total_points, 5);
}

#[tokio::test]
async fn test_trend_for_unrepresentable_day_is_rejected() {
    let s = season();
    let settings = EngineSettings::default();

    let err = update_daily_trend(&s.store, &settings, s.alice, NaiveDate::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DateOutOfRange(d) if d == NaiveDate::MAX));
    assert_eq!(err.stage(), PassStage::Trends);
    assert!(!err.is_transient());

    let err = update_all_daily_trends(&s.store, &settings, NaiveDate::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DateOutOfRange(_)));
    assert!(s.store.trend(s.alice, NaiveDate::MAX).is_none());
}
