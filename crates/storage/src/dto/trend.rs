use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendFailure {
    pub user_id: Uuid,
    pub error: String,
}

/// Outcome of a daily trend run over all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendBatchReport {
    pub date: NaiveDate,
    pub users_processed: u64,
    pub snapshots_written: u64,
    pub failures: Vec<TrendFailure>,
}

impl TrendBatchReport {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            users_processed: 0,
            snapshots_written: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
