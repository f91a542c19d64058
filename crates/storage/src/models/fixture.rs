use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::score::MatchResult;

/// A scheduled match as seen by the engine.
///
/// Scores stay `None` until the results-entry process records them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub match_id: Uuid,
    pub round_id: Uuid,
    pub match_date: DateTime<Utc>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_cancelled: bool,
}

impl Match {
    pub fn result(&self) -> MatchResult {
        MatchResult {
            home: self.home_score,
            away: self.away_score,
            cancelled: self.is_cancelled,
        }
    }
}
