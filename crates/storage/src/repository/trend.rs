use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::ledger::DailyTotals;
use crate::error::Result;
use crate::models::UserBettingTrend;

pub struct TrendRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TrendRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, totals: &DailyTotals) -> Result<UserBettingTrend> {
        let trend = sqlx::query_as::<_, UserBettingTrend>(
            r#"
            INSERT INTO user_betting_trends (user_id, trend_date, total_bets, correct_bets, total_points)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, trend_date)
            DO UPDATE SET
                total_bets = EXCLUDED.total_bets,
                correct_bets = EXCLUDED.correct_bets,
                total_points = EXCLUDED.total_points,
                updated_at = CURRENT_TIMESTAMP
            RETURNING user_id, trend_date, total_bets, correct_bets, total_points, updated_at
            "#,
        )
        .bind(totals.user_id)
        .bind(totals.date)
        .bind(totals.total_bets)
        .bind(totals.correct_bets)
        .bind(totals.total_points)
        .fetch_one(self.pool)
        .await?;

        Ok(trend)
    }

    pub async fn list_since(&self, user_id: Uuid, since: NaiveDate) -> Result<Vec<UserBettingTrend>> {
        let trends = sqlx::query_as::<_, UserBettingTrend>(
            r#"
            SELECT user_id, trend_date, total_bets, correct_bets, total_points, updated_at
            FROM user_betting_trends
            WHERE user_id = $1 AND trend_date >= $2
            ORDER BY trend_date DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(trends)
    }
}
