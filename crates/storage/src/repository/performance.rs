use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::ledger::{RankUpdate, ReplaceOutcome, UserLeagueTotals};
use crate::error::Result;
use crate::models::UserLeaguePerformance;

pub struct PerformanceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PerformanceRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Replaces the league's rows with `totals` in one transaction.
    pub async fn replace_for_league(
        &self,
        league_id: Uuid,
        totals: &[UserLeagueTotals],
    ) -> Result<ReplaceOutcome> {
        let user_ids: Vec<Uuid> = totals.iter().map(|t| t.user_id).collect();
        let total_bets: Vec<i64> = totals.iter().map(|t| t.total_bets).collect();
        let correct_bets: Vec<i64> = totals.iter().map(|t| t.correct_bets).collect();
        let total_points: Vec<i64> = totals.iter().map(|t| t.total_points).collect();

        let mut tx = self.pool.begin().await?;

        let upserted = sqlx::query(
            r#"
            INSERT INTO user_league_performance
                (user_id, league_id, total_bets, correct_bets, total_points, updated_at)
            SELECT t.user_id, $1, t.total_bets, t.correct_bets, t.total_points, CURRENT_TIMESTAMP
            FROM UNNEST($2::uuid[], $3::int8[], $4::int8[], $5::int8[])
                AS t(user_id, total_bets, correct_bets, total_points)
            ON CONFLICT (user_id, league_id)
            DO UPDATE SET
                total_bets = EXCLUDED.total_bets,
                correct_bets = EXCLUDED.correct_bets,
                total_points = EXCLUDED.total_points,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(league_id)
        .bind(&user_ids)
        .bind(&total_bets)
        .bind(&correct_bets)
        .bind(&total_points)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let removed = sqlx::query(
            r#"
            DELETE FROM user_league_performance
            WHERE league_id = $1 AND NOT (user_id = ANY($2::uuid[]))
            "#,
        )
        .bind(league_id)
        .bind(&user_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(ReplaceOutcome { upserted, removed })
    }

    pub async fn list_for_league(&self, league_id: Uuid) -> Result<Vec<UserLeaguePerformance>> {
        let rows = sqlx::query_as::<_, UserLeaguePerformance>(
            r#"
            SELECT p.user_id, p.league_id, u.username, p.total_bets, p.correct_bets,
                   p.total_points, p.rank, p.updated_at
            FROM user_league_performance p
            INNER JOIN users u ON u.user_id = p.user_id
            WHERE p.league_id = $1
            "#,
        )
        .bind(league_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn store_ranks(&self, league_id: Uuid, ranks: &[RankUpdate]) -> Result<()> {
        if ranks.is_empty() {
            return Ok(());
        }

        let (user_ids, values): (Vec<Uuid>, Vec<i32>) =
            ranks.iter().map(|r| (r.user_id, r.rank)).unzip();

        sqlx::query(
            r#"
            UPDATE user_league_performance AS p
            SET rank = r.rank
            FROM UNNEST($2::uuid[], $3::int4[]) AS r(user_id, rank)
            WHERE p.league_id = $1 AND p.user_id = r.user_id
            "#,
        )
        .bind(league_id)
        .bind(&user_ids)
        .bind(&values)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
