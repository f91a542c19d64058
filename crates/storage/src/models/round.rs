use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Round {
    pub round_id: Uuid,
    pub competition_id: Uuid,
    pub name: String,
    pub deadline: DateTime<Utc>,
}
