use std::time::Duration;

use storage::EngineSettings;
use storage::settings::DEFAULT_PAGE_SIZE;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::jobs::JobLimits;
use crate::runner::Intervals;

/// Engine tunables shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct EngineArgs {
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub database_max_connections: u32,

    #[arg(long, env = "ENGINE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: i64,

    #[arg(
        long,
        env = "TREND_UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub trend_utc_offset_minutes: i32,

    #[arg(long, env = "PASS_TIMEOUT_SECS", default_value_t = 900)]
    pub pass_timeout_secs: u64,

    #[arg(long, env = "MAX_CONCURRENT_LEAGUES", default_value_t = 4)]
    pub max_concurrent_leagues: usize,
}

impl EngineArgs {
    pub fn settings(&self) -> Result<EngineSettings> {
        let settings = EngineSettings {
            page_size: self.page_size,
            trend_utc_offset_minutes: self.trend_utc_offset_minutes,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn limits(&self) -> Result<JobLimits> {
        let limits = JobLimits {
            pass_timeout_secs: self.pass_timeout_secs,
            max_concurrent_leagues: self.max_concurrent_leagues,
        };
        limits.validate()?;
        PoolSize {
            max_connections: self.database_max_connections,
            concurrent_leagues: self.max_concurrent_leagues,
        }
        .validate()?;
        Ok(limits)
    }
}

/// Every concurrent league pass holds a connection for its lock, so the
/// pool needs one more to list leagues and serve other jobs.
#[derive(Debug, Validate)]
#[validate(schema(function = "validate_pool_size"))]
struct PoolSize {
    max_connections: u32,
    concurrent_leagues: usize,
}

fn validate_pool_size(pool: &PoolSize) -> std::result::Result<(), ValidationError> {
    let fits = usize::try_from(pool.max_connections)
        .is_ok_and(|connections| connections > pool.concurrent_leagues);
    if fits {
        return Ok(());
    }

    let mut err = ValidationError::new("pool_too_small");
    err.message = Some(
        format!(
            "database pool of {} connection(s) cannot serve {} concurrent league(s)",
            pool.max_connections, pool.concurrent_leagues
        )
        .into(),
    );
    Err(err)
}

/// Job periods for the long-running loop.
#[derive(Debug, Clone, clap::Args)]
pub struct IntervalArgs {
    #[arg(long, env = "SCORING_INTERVAL_SECS", default_value_t = 3600)]
    pub scoring_interval_secs: u64,

    #[arg(long, env = "LEADERBOARD_INTERVAL_SECS", default_value_t = 14_400)]
    pub leaderboard_interval_secs: u64,

    #[arg(long, env = "TREND_INTERVAL_SECS", default_value_t = 86_400)]
    pub trend_interval_secs: u64,

    #[arg(long, env = "REPORT_INTERVAL_SECS", default_value_t = 2_592_000)]
    pub report_interval_secs: u64,
}

#[derive(Debug, Validate)]
struct IntervalSecs {
    #[validate(range(min = 1, message = "scoring interval must be at least one second"))]
    scoring: u64,
    #[validate(range(min = 1, message = "leaderboard interval must be at least one second"))]
    leaderboard: u64,
    #[validate(range(min = 1, message = "trend interval must be at least one second"))]
    trends: u64,
    #[validate(range(min = 1, message = "report interval must be at least one second"))]
    reports: u64,
}

impl IntervalArgs {
    pub fn intervals(&self) -> Result<Intervals> {
        let secs = IntervalSecs {
            scoring: self.scoring_interval_secs,
            leaderboard: self.leaderboard_interval_secs,
            trends: self.trend_interval_secs,
            reports: self.report_interval_secs,
        };
        secs.validate()?;

        Ok(Intervals {
            scoring: Duration::from_secs(secs.scoring),
            leaderboard: Duration::from_secs(secs.leaderboard),
            trends: Duration::from_secs(secs.trends),
            reports: Duration::from_secs(secs.reports),
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::error::SchedulerError;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        intervals: IntervalArgs,
    }

    fn parse(args: &[&str]) -> TestCli {
        TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        let settings = cli.engine.settings().unwrap();
        assert_eq!(settings.page_size, 500);
        assert_eq!(settings.trend_utc_offset_minutes, 0);

        let limits = cli.engine.limits().unwrap();
        assert_eq!(limits.pass_timeout(), Duration::from_secs(900));
        assert_eq!(limits.max_concurrent_leagues, 4);

        let intervals = cli.intervals.intervals().unwrap();
        assert_eq!(intervals.scoring, Duration::from_secs(3600));
        assert_eq!(intervals.leaderboard, Duration::from_secs(4 * 3600));
        assert_eq!(intervals.trends, Duration::from_secs(24 * 3600));
        assert_eq!(intervals.reports, Duration::from_secs(30 * 24 * 3600));
    }

    #[test]
    fn test_negative_offset_parses() {
        let cli = parse(&["--trend-utc-offset-minutes", "-300"]);
        let settings = cli.engine.settings().unwrap();
        assert_eq!(settings.trend_utc_offset_minutes, -300);
    }

    #[test]
    fn test_page_size_is_validated() {
        let cli = parse(&["--page-size", "0"]);
        assert!(matches!(cli.engine.settings(), Err(SchedulerError::Config(_))));

        let cli = parse(&["--page-size", "20000"]);
        assert!(matches!(cli.engine.settings(), Err(SchedulerError::Config(_))));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let cli = parse(&["--max-concurrent-leagues", "0"]);
        assert!(matches!(cli.engine.limits(), Err(SchedulerError::Config(_))));
    }

    #[test]
    fn test_pool_must_outnumber_concurrent_leagues() {
        let cli = parse(&["--max-concurrent-leagues", "5"]);
        assert!(matches!(cli.engine.limits(), Err(SchedulerError::Config(_))));

        let cli = parse(&["--database-max-connections", "6", "--max-concurrent-leagues", "5"]);
        assert_eq!(cli.engine.limits().unwrap().max_concurrent_leagues, 5);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let cli = parse(&["--trend-interval-secs", "0"]);
        assert!(matches!(cli.intervals.intervals(), Err(SchedulerError::Config(_))));
    }
}
