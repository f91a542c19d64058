use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted league report. Reports are appended, never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeagueReportRecord {
    pub report_id: Uuid,
    pub league_id: Uuid,
    pub report_type: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
