use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;

/// Held advisory lock on one league. Dropping it ends the transaction, which
/// releases the lock even if the pass was cancelled midway.
pub type LeagueLockGuard = Transaction<'static, Postgres>;

pub struct LockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LockRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Waits until the league's transaction-scoped advisory lock is free.
    pub async fn lock_league(&self, league_id: Uuid) -> Result<LeagueLockGuard> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(league_id)
            .execute(&mut *tx)
            .await?;

        tracing::debug!(%league_id, "Acquired league advisory lock");
        Ok(tx)
    }
}
