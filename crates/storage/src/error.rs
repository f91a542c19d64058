use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Store unavailability or timeouts. The next scheduled pass is the retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// Stage of a pass at which a store failure aborted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStage {
    Lookup,
    Locking,
    Scoring,
    Aggregation,
    Ranking,
    Trends,
    Reporting,
}

impl fmt::Display for PassStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lookup => "lookup",
            Self::Locking => "locking",
            Self::Scoring => "scoring",
            Self::Aggregation => "aggregation",
            Self::Ranking => "ranking",
            Self::Trends => "trends",
            Self::Reporting => "reporting",
        };
        f.write_str(name)
    }
}

/// Pass-level failure of an engine entry point.
///
/// Per-record problems never surface here: they are skipped and counted by
/// the pass itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("League {0} not found")]
    LeagueNotFound(Uuid),

    #[error("{stage} failed for league {league_id}: {source}")]
    League {
        league_id: Uuid,
        stage: PassStage,
        #[source]
        source: StorageError,
    },

    #[error("trend aggregation failed for user {user_id} on {date}: {source}")]
    Trend {
        user_id: Uuid,
        date: NaiveDate,
        #[source]
        source: StorageError,
    },

    #[error("date {0} is outside the supported range")]
    DateOutOfRange(NaiveDate),

    #[error("user enumeration failed for trends on {date}: {source}")]
    UserEnumeration {
        date: NaiveDate,
        #[source]
        source: StorageError,
    },
}

impl EngineError {
    pub fn league(league_id: Uuid, stage: PassStage) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::League {
            league_id,
            stage,
            source,
        }
    }

    pub fn stage(&self) -> PassStage {
        match self {
            Self::LeagueNotFound(_) => PassStage::Lookup,
            Self::League { stage, .. } => *stage,
            Self::Trend { .. } | Self::DateOutOfRange(_) | Self::UserEnumeration { .. } => {
                PassStage::Trends
            }
        }
    }

    /// Whether the underlying store failure may clear up on the next run.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::League { source, .. }
            | Self::Trend { source, .. }
            | Self::UserEnumeration { source, .. } => source.is_transient(),
            Self::LeagueNotFound(_) | Self::DateOutOfRange(_) => false,
        }
    }
}
