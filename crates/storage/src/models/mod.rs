mod bet;
mod competition;
mod fixture;
mod league;
mod league_report;
mod performance;
mod round;
mod score;
mod trend;
mod user;

pub use bet::Bet;
pub use competition::Competition;
pub use fixture::Match;
pub use league::League;
pub use league_report::LeagueReportRecord;
pub use performance::UserLeaguePerformance;
pub use round::Round;
pub use score::{MatchResult, Outcome, Prediction};
pub use trend::UserBettingTrend;
pub use user::User;
