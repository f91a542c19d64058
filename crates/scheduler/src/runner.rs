use std::future::Future;
use std::time::Duration;

use storage::EngineStore;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::jobs::{JobSummary, Jobs, LeagueJob};

/// How often each job kind fires in the long-running loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub scoring: Duration,
    pub leaderboard: Duration,
    pub trends: Duration,
    pub reports: Duration,
}

fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Runs every job on its interval until Ctrl-C.
pub async fn run<S>(jobs: Jobs<S>, intervals: Intervals, report_type: String)
where
    S: EngineStore + ?Sized + 'static,
{
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run_until(jobs, intervals, report_type, shutdown).await;
}

/// Runs every job on its interval until `shutdown` resolves.
///
/// All jobs fire once on start. A job in progress is finished before the
/// loop checks for shutdown again.
pub async fn run_until<S, F>(
    jobs: Jobs<S>,
    intervals: Intervals,
    report_type: String,
    shutdown: F,
) where
    S: EngineStore + ?Sized + 'static,
    F: Future<Output = ()>,
{
    let mut scoring = ticker(intervals.scoring);
    let mut leaderboard = ticker(intervals.leaderboard);
    let mut trends = ticker(intervals.trends);
    let mut reports = ticker(intervals.reports);
    let report_job = LeagueJob::Report { report_type };

    tokio::pin!(shutdown);

    info!(?intervals, "Scheduler started");

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested, stopping scheduler");
                break;
            }
            _ = scoring.tick() => {
                log_outcome(jobs.run_all_leagues(LeagueJob::Recompute).await);
            }
            _ = leaderboard.tick() => {
                log_outcome(jobs.run_all_leagues(LeagueJob::Leaderboard).await);
            }
            _ = trends.tick() => {
                for outcome in jobs.update_recent_trends().await {
                    match outcome {
                        Ok(report) if report.is_complete() => {}
                        Ok(report) => warn!(
                            date = %report.date,
                            failed = report.failures.len(),
                            "Trend run left users without a snapshot"
                        ),
                        Err(e) => error!(error = %e, "Trend job failed"),
                    }
                }
            }
            _ = reports.tick() => {
                log_outcome(jobs.run_all_leagues(report_job.clone()).await);
            }
        }
    }
}

fn log_outcome(outcome: Result<JobSummary>) {
    if let Err(e) = outcome {
        error!(error = %e, "Job could not start");
    }
}
