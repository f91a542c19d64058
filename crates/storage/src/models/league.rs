use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Top-level grouping of competitions with its own leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct League {
    pub league_id: Uuid,
    pub name: String,
    pub season: String,
}
