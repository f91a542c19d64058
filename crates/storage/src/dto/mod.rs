pub mod common;
pub mod leaderboard;
pub mod ledger;
pub mod recompute;
pub mod report;
pub mod trend;
