use serde::Serialize;
use uuid::Uuid;

/// Summary of one league recomputation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeResult {
    pub league_id: Uuid,
    pub matches_scanned: u64,
    pub bets_updated: u64,
    pub bets_skipped: u64,
    /// Skipped bets whose stale points were cleared.
    pub bets_reset: u64,
    pub users_updated: u64,
    pub stale_rows_removed: u64,
}

impl RecomputeResult {
    pub fn new(league_id: Uuid) -> Self {
        Self {
            league_id,
            ..Self::default()
        }
    }
}
