use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use storage::dto::leaderboard::Leaderboard;
use storage::dto::recompute::RecomputeResult;
use storage::dto::trend::TrendBatchReport;
use storage::models::{LeagueReportRecord, UserBettingTrend};
use storage::services;
use storage::{EngineError, EngineSettings, EngineStore};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Result, SchedulerError};

/// Time budget and fan-out width for engine passes.
#[derive(Debug, Clone, Copy, Validate)]
pub struct JobLimits {
    #[validate(range(min = 1, message = "pass timeout must be at least one second"))]
    pub pass_timeout_secs: u64,

    #[validate(range(min = 1, message = "at least one league must run at a time"))]
    pub max_concurrent_leagues: usize,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            pass_timeout_secs: 900,
            max_concurrent_leagues: 4,
        }
    }
}

impl JobLimits {
    pub fn pass_timeout(&self) -> Duration {
        Duration::from_secs(self.pass_timeout_secs)
    }
}

/// A pass that runs once per league.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeagueJob {
    Recompute,
    Leaderboard,
    Report { report_type: String },
}

impl fmt::Display for LeagueJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recompute => f.write_str("recompute"),
            Self::Leaderboard => f.write_str("leaderboard"),
            Self::Report { report_type } => write!(f, "{report_type} report"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    /// `None` when the task died before reporting its league.
    pub league_id: Option<Uuid>,
    pub error: String,
    /// Set when a later run is expected to succeed on its own.
    pub transient: bool,
}

/// Outcome of one pass fanned out over every league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job: String,
    pub succeeded: u64,
    pub failures: Vec<JobFailure>,
}

impl JobSummary {
    fn new(job: &LeagueJob) -> Self {
        Self {
            job: job.to_string(),
            succeeded: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn log(&self) {
        if self.is_success() {
            info!(job = %self.job, succeeded = self.succeeded, "Job finished");
        } else {
            warn!(
                job = %self.job,
                succeeded = self.succeeded,
                failed = self.failed(),
                "Job finished with failures"
            );
        }
    }
}

/// Runs engine passes against a shared store under the configured limits.
pub struct Jobs<S: ?Sized> {
    store: Arc<S>,
    settings: EngineSettings,
    limits: JobLimits,
}

impl<S: ?Sized> Clone for Jobs<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
            limits: self.limits,
        }
    }
}

impl<S> Jobs<S>
where
    S: EngineStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, settings: EngineSettings, limits: JobLimits) -> Self {
        Self {
            store,
            settings,
            limits,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    async fn timed<T, F>(&self, job: String, pass: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, EngineError>>,
    {
        let after = self.limits.pass_timeout();
        match tokio::time::timeout(after, pass).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SchedulerError::TimedOut { job, after }),
        }
    }

    pub async fn recompute_league(&self, league_id: Uuid) -> Result<RecomputeResult> {
        self.timed(
            format!("recompute of league {league_id}"),
            services::recompute(&*self.store, &self.settings, league_id),
        )
        .await
    }

    pub async fn build_leaderboard(&self, league_id: Uuid) -> Result<Leaderboard> {
        self.timed(
            format!("leaderboard of league {league_id}"),
            services::build_leaderboard(&*self.store, league_id),
        )
        .await
    }

    pub async fn generate_report(
        &self,
        league_id: Uuid,
        report_type: &str,
    ) -> Result<LeagueReportRecord> {
        self.timed(
            format!("{report_type} report of league {league_id}"),
            services::generate_league_report(&*self.store, &self.settings, league_id, report_type),
        )
        .await
    }

    pub async fn update_user_trend(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<UserBettingTrend> {
        self.timed(
            format!("trend of user {user_id} on {date}"),
            services::update_daily_trend(&*self.store, &self.settings, user_id, date),
        )
        .await
    }

    pub async fn update_trends(&self, date: NaiveDate) -> Result<TrendBatchReport> {
        self.timed(
            format!("trends on {date}"),
            services::update_all_daily_trends(&*self.store, &self.settings, date),
        )
        .await
    }

    /// Trend snapshots for yesterday and today, so late results on the
    /// previous day are picked up once.
    pub async fn update_recent_trends(&self) -> Vec<Result<TrendBatchReport>> {
        let today = self.settings.today();
        let mut reports = Vec::with_capacity(2);
        if let Some(yesterday) = today.pred_opt() {
            reports.push(self.update_trends(yesterday).await);
        }
        reports.push(self.update_trends(today).await);
        reports
    }

    async fn run_league(&self, job: &LeagueJob, league_id: Uuid) -> Result<()> {
        match job {
            LeagueJob::Recompute => self.recompute_league(league_id).await.map(drop),
            LeagueJob::Leaderboard => self.build_leaderboard(league_id).await.map(drop),
            LeagueJob::Report { report_type } => {
                self.generate_report(league_id, report_type).await.map(drop)
            }
        }
    }

    /// Runs `job` for every league, at most `max_concurrent_leagues` at a time.
    ///
    /// A failing league is recorded in the summary and never stops the others.
    /// Only a failure to list the leagues is returned as an error.
    #[tracing::instrument(skip_all, fields(%job))]
    pub async fn run_all_leagues(&self, job: LeagueJob) -> Result<JobSummary> {
        let league_ids = self.store.list_league_ids().await?;
        let permits = Arc::new(Semaphore::new(self.limits.max_concurrent_leagues));
        let mut tasks = JoinSet::new();

        for league_id in league_ids {
            let jobs = self.clone();
            let job = job.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                (league_id, jobs.run_league(&job, league_id).await)
            });
        }

        let mut summary = JobSummary::new(&job);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => summary.succeeded += 1,
                Ok((league_id, Err(e))) => {
                    let transient = e.is_transient();
                    error!(%league_id, error = %e, transient, "League job failed");
                    summary.failures.push(JobFailure {
                        league_id: Some(league_id),
                        error: e.to_string(),
                        transient,
                    });
                }
                Err(e) => {
                    error!(error = %e, "League task aborted");
                    summary.failures.push(JobFailure {
                        league_id: None,
                        error: e.to_string(),
                        transient: false,
                    });
                }
            }
        }

        summary.log();
        Ok(summary)
    }
}
