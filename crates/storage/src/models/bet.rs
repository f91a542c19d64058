use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::score::Prediction;

/// One user's prediction for one match.
///
/// `points_earned` is written only by the recomputation pass.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bet {
    pub bet_id: Uuid,
    pub user_id: Uuid,
    pub match_id: Uuid,
    pub home_prediction: i32,
    pub away_prediction: i32,
    pub points_earned: i32,
}

impl Bet {
    pub fn prediction(&self) -> Prediction {
        Prediction {
            home: self.home_prediction,
            away: self.away_prediction,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.points_earned > 0
    }
}
