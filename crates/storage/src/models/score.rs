use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Outcome class of a scoreline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl Outcome {
    pub fn of(home: i32, away: i32) -> Self {
        match home.cmp(&away) {
            Ordering::Greater => Self::HomeWin,
            Ordering::Less => Self::AwayWin,
            Ordering::Equal => Self::Draw,
        }
    }
}

/// Predicted final score of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub home: i32,
    pub away: i32,
}

impl Prediction {
    pub fn new(home: i32, away: i32) -> Self {
        Self { home, away }
    }

    /// Goal counts are validated when the bet is placed; a negative value
    /// here means the record is malformed.
    pub fn is_valid(&self) -> bool {
        self.home >= 0 && self.away >= 0
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::of(self.home, self.away)
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.home) - i64::from(self.away)
    }
}

/// Actual result of a match, possibly not yet played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub home: Option<i32>,
    pub away: Option<i32>,
    pub cancelled: bool,
}

impl MatchResult {
    pub fn final_score(home: i32, away: i32) -> Self {
        Self {
            home: Some(home),
            away: Some(away),
            cancelled: false,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    /// A recorded score below zero is malformed.
    pub fn is_valid(&self) -> bool {
        self.home.is_none_or(|h| h >= 0) && self.away.is_none_or(|a| a >= 0)
    }

    /// Final scoreline, or `None` while undecided or when cancelled.
    pub fn scoreline(&self) -> Option<(i32, i32)> {
        if self.cancelled {
            return None;
        }
        self.home.zip(self.away)
    }
}
