pub mod leaderboard;
pub mod recomputation;
pub mod report;
pub mod scoring;
pub mod trends;

pub use leaderboard::{build_leaderboard, rank_performances};
pub use recomputation::recompute;
pub use report::generate_league_report;
pub use scoring::score;
pub use trends::{recent_trends, update_all_daily_trends, update_daily_trend};
