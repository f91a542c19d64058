use std::time::Duration;

use storage::{EngineError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{job} timed out after {after:?}")]
    TimedOut { job: String, after: Duration },

    #[error("Invalid configuration: {0}")]
    Config(#[from] validator::ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SchedulerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Whether the next scheduled run may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TimedOut { .. } => true,
            Self::Engine(e) => e.is_transient(),
            Self::Storage(e) => e.is_transient(),
            Self::Config(_) => false,
        }
    }
}
