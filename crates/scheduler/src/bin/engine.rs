use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use scheduler::config::{EngineArgs, IntervalArgs};
use scheduler::{JobSummary, Jobs, LeagueJob, runner};
use storage::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const TOP_ENTRIES: usize = 10;

#[derive(Parser)]
#[command(name = "tipster-engine")]
#[command(about = "Scoring and leaderboard engine for prediction leagues", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(flatten)]
    engine: EngineArgs,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-score bets and rebuild standings for one league or all of them.
    Recompute {
        #[arg(long)]
        league: Option<Uuid>,
    },
    /// Rank users and store their positions.
    Leaderboard {
        #[arg(long)]
        league: Option<Uuid>,
    },
    /// Write daily trend snapshots.
    Trends {
        /// Defaults to today in the configured trend offset.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        user: Option<Uuid>,
    },
    Report {
        #[arg(long)]
        league: Uuid,

        #[arg(long, default_value = "monthly")]
        report_type: String,
    },
    /// Run every job on its interval until interrupted.
    Run {
        #[command(flatten)]
        intervals: IntervalArgs,

        #[arg(long, default_value = "monthly")]
        report_type: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tipster_engine={},scheduler={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = cli.engine.settings().context("Invalid engine settings")?;
    let limits = cli.engine.limits().context("Invalid job limits")?;

    tracing::info!(
        "Connecting to database at: {}",
        cli.database_url.split('@').next_back().unwrap_or("unknown")
    );
    let db = Database::with_max_connections(&cli.database_url, cli.engine.database_max_connections)
        .await
        .context("Failed to initialize database")?;

    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let jobs = Jobs::new(Arc::new(db), settings, limits);

    match cli.command {
        Commands::Recompute { league: Some(league_id) } => {
            let result = jobs.recompute_league(league_id).await?;
            tracing::info!(
                "League {}: {} bets updated, {} skipped ({} cleared), {} users",
                league_id,
                result.bets_updated,
                result.bets_skipped,
                result.bets_reset,
                result.users_updated
            );
        }
        Commands::Recompute { league: None } => {
            check(jobs.run_all_leagues(LeagueJob::Recompute).await?)?;
        }
        Commands::Leaderboard { league: Some(league_id) } => {
            let board = jobs.build_leaderboard(league_id).await?;
            for entry in board.entries.iter().take(TOP_ENTRIES) {
                tracing::info!(
                    "#{} {} {} pts ({} / {} correct, accuracy {})",
                    entry.rank,
                    entry.username,
                    entry.total_points,
                    entry.correct_bets,
                    entry.total_bets,
                    entry.accuracy
                );
            }
        }
        Commands::Leaderboard { league: None } => {
            check(jobs.run_all_leagues(LeagueJob::Leaderboard).await?)?;
        }
        Commands::Trends { date, user } => {
            let date = date.unwrap_or_else(|| jobs.settings().today());
            match user {
                Some(user_id) => {
                    let trend = jobs.update_user_trend(user_id, date).await?;
                    tracing::info!(
                        "Trend for {} on {}: {} bets, {} points",
                        user_id,
                        date,
                        trend.total_bets,
                        trend.total_points
                    );
                }
                None => {
                    let report = jobs.update_trends(date).await?;
                    if !report.is_complete() {
                        bail!(
                            "{} of {} user(s) failed trend aggregation for {}",
                            report.failures.len(),
                            report.users_processed,
                            date
                        );
                    }
                }
            }
        }
        Commands::Report {
            league,
            report_type,
        } => {
            let report = jobs.generate_report(league, &report_type).await?;
            tracing::info!("Stored {} report {}", report.report_type, report.report_id);
        }
        Commands::Run {
            intervals,
            report_type,
        } => {
            let intervals = intervals.intervals().context("Invalid job intervals")?;
            runner::run(jobs, intervals, report_type).await;
        }
    }

    Ok(())
}

fn check(summary: JobSummary) -> anyhow::Result<()> {
    if !summary.is_success() {
        bail!(
            "{}: {} league(s) failed, {} succeeded",
            summary.job,
            summary.failed(),
            summary.succeeded
        );
    }
    Ok(())
}
