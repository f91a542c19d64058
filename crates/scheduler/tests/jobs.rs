use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use scheduler::runner::run_until;
use scheduler::{Intervals, JobLimits, Jobs, LeagueJob, SchedulerError};
use storage::memory::MemoryStore;
use storage::traits::LeagueLocks;
use storage::{EngineError, EngineSettings};
use uuid::Uuid;

struct League {
    league_id: Uuid,
    user_id: Uuid,
}

/// Adds a league with one decided match and one exact bet on it.
fn league_with_bet(store: &MemoryStore, name: &str) -> League {
    let league_id = store.add_league(name, "2025");
    let competition = store.add_competition(name, &[league_id]);
    let round = store.add_round(competition, "Round 1");
    let fixture = store.add_match(round, Utc.with_ymd_and_hms(2025, 5, 10, 15, 0, 0).unwrap());
    store.set_result(fixture, 3, 1);

    let user_id = store.add_user(&format!("{name}-fan"));
    store.add_bet(user_id, fixture, 3, 1);

    League { league_id, user_id }
}

fn jobs(store: &Arc<MemoryStore>, limits: JobLimits) -> Jobs<MemoryStore> {
    Jobs::new(Arc::clone(store), EngineSettings::default(), limits)
}

#[tokio::test]
async fn test_recompute_all_leagues() {
    let store = Arc::new(MemoryStore::new());
    let first = league_with_bet(&store, "north");
    let second = league_with_bet(&store, "south");

    let summary = jobs(&store, JobLimits::default())
        .run_all_leagues(LeagueJob::Recompute)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    assert!(summary.is_success());
    assert_eq!(
        store.performance(first.league_id, first.user_id).unwrap().total_points,
        17
    );
    assert_eq!(
        store.performance(second.league_id, second.user_id).unwrap().total_points,
        17
    );
}

#[tokio::test]
async fn test_failing_league_does_not_stop_others() {
    let store = Arc::new(MemoryStore::new());
    league_with_bet(&store, "north");
    league_with_bet(&store, "south");
    league_with_bet(&store, "east");

    // Each league writes points once; the second write onwards fails.
    store.fail_point_writes_after(1);

    let limits = JobLimits {
        max_concurrent_leagues: 1,
        ..JobLimits::default()
    };
    let summary = jobs(&store, limits)
        .run_all_leagues(LeagueJob::Recompute)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed(), 2);
    assert!(summary.failures.iter().all(|f| f.league_id.is_some()));
    // A store timeout clears up on its own.
    assert!(summary.failures.iter().all(|f| f.transient));
}

#[tokio::test]
async fn test_missing_league_failure_is_not_transient() {
    let store = Arc::new(MemoryStore::new());
    let err = jobs(&store, JobLimits::default())
        .recompute_league(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_pass_over_budget_times_out() {
    let store = Arc::new(MemoryStore::new());
    let league = league_with_bet(&store, "north");
    let jobs = Jobs::new(Arc::clone(&store), EngineSettings::default(), JobLimits {
        pass_timeout_secs: 1,
        max_concurrent_leagues: 1,
    });

    let guard = store.lock(league.league_id).await.unwrap();
    let err = jobs.recompute_league(league.league_id).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(err, SchedulerError::TimedOut { after, .. } if after == Duration::from_secs(1)));

    drop(guard);
    let result = jobs.recompute_league(league.league_id).await.unwrap();
    assert_eq!(result.users_updated, 1);
}

#[tokio::test]
async fn test_unknown_league_is_engine_error() {
    let store = Arc::new(MemoryStore::new());
    let err = jobs(&store, JobLimits::default())
        .build_leaderboard(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulerError::Engine(EngineError::LeagueNotFound(_))));
}

#[tokio::test]
async fn test_reports_for_every_league() {
    let store = Arc::new(MemoryStore::new());
    league_with_bet(&store, "north");
    league_with_bet(&store, "south");
    let jobs = jobs(&store, JobLimits::default());

    jobs.run_all_leagues(LeagueJob::Recompute).await.unwrap();
    let summary = jobs
        .run_all_leagues(LeagueJob::Report {
            report_type: "monthly".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(summary.job, "monthly report");
    assert_eq!(summary.succeeded, 2);
    let reports = store.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.report_type == "monthly"));
}

#[tokio::test]
async fn test_recent_trends_cover_yesterday_and_today() {
    let store = Arc::new(MemoryStore::new());
    let league = league_with_bet(&store, "north");
    let jobs = jobs(&store, JobLimits::default());

    let outcomes = jobs.update_recent_trends().await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.as_ref().is_ok_and(|r| r.is_complete())));

    let today = jobs.settings().today();
    assert!(store.trend(league.user_id, today).is_some());
    assert!(store.trend(league.user_id, today.pred_opt().unwrap()).is_some());
}

#[tokio::test]
async fn test_scheduler_runs_each_job_on_start() {
    let store = Arc::new(MemoryStore::new());
    let league = league_with_bet(&store, "north");
    let hour = Duration::from_secs(3600);
    let intervals = Intervals {
        scoring: hour,
        leaderboard: hour,
        trends: hour,
        reports: hour,
    };

    run_until(
        jobs(&store, JobLimits::default()),
        intervals,
        "monthly".to_string(),
        tokio::time::sleep(Duration::from_millis(300)),
    )
    .await;

    let row = store.performance(league.league_id, league.user_id).unwrap();
    assert_eq!(row.total_points, 17);
    assert_eq!(row.rank, 1);
    assert_eq!(store.reports().len(), 1);

    let today = EngineSettings::default().today();
    assert!(store.trend(league.user_id, today).is_some());
}
