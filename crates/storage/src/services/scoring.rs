use crate::models::{MatchResult, Outcome, Prediction};

pub const OUTCOME_POINTS: i32 = 3;
pub const HOME_GOALS_POINTS: i32 = 1;
pub const AWAY_GOALS_POINTS: i32 = 1;
pub const GOAL_DIFFERENCE_POINTS: i32 = 2;
pub const EXACT_SCORE_POINTS: i32 = 10;

/// Highest attainable score: every rule satisfied at once.
pub const MAX_POINTS: i32 = OUTCOME_POINTS
    + HOME_GOALS_POINTS
    + AWAY_GOALS_POINTS
    + GOAL_DIFFERENCE_POINTS
    + EXACT_SCORE_POINTS;

/// Points earned by `prediction` against `result`.
///
/// Undecided and cancelled matches are worth nothing. Otherwise every rule
/// is evaluated on its own and the bonuses are summed, so the value always
/// lies in `0..=MAX_POINTS`.
pub fn score(prediction: Prediction, result: MatchResult) -> i32 {
    let Some((home, away)) = result.scoreline() else {
        return 0;
    };

    let mut points = 0;

    if prediction.outcome() == Outcome::of(home, away) {
        points += OUTCOME_POINTS;
    }
    if prediction.home == home {
        points += HOME_GOALS_POINTS;
    }
    if prediction.away == away {
        points += AWAY_GOALS_POINTS;
    }
    if prediction.goal_difference() == i64::from(home) - i64::from(away) {
        points += GOAL_DIFFERENCE_POINTS;
    }
    if prediction.home == home && prediction.away == away {
        points += EXACT_SCORE_POINTS;
    }

    points
}
