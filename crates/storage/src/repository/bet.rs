use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::dto::ledger::{PointsUpdate, ScoredBet, UserLeagueTotals};
use crate::error::Result;
use crate::models::Bet;

/// Bets belonging to a league: the match sits in a round of a competition
/// linked to the league.
const IN_LEAGUE: &str = r#"
    EXISTS (
        SELECT 1
        FROM matches lm
        INNER JOIN rounds lr ON lr.round_id = lm.round_id
        INNER JOIN competition_leagues lcl ON lcl.competition_id = lr.competition_id
        WHERE lm.match_id = b.match_id AND lcl.league_id = $1
    )
"#;

pub struct BetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BetRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_match(&self, match_id: Uuid, page: PageRequest) -> Result<Vec<Bet>> {
        let bets = sqlx::query_as::<_, Bet>(
            r#"
            SELECT bet_id, user_id, match_id, home_prediction, away_prediction, points_earned
            FROM bets
            WHERE match_id = $1
              AND ($2::uuid IS NULL OR bet_id > $2)
            ORDER BY bet_id
            LIMIT $3
            "#,
        )
        .bind(match_id)
        .bind(page.after)
        .bind(page.limit)
        .fetch_all(self.pool)
        .await?;

        Ok(bets)
    }

    pub async fn set_points(&self, updates: &[PointsUpdate]) -> Result<u64> {
        if updates.is_empty() {
            return Ok(0);
        }

        let (bet_ids, points): (Vec<Uuid>, Vec<i32>) =
            updates.iter().map(|u| (u.bet_id, u.points)).unzip();

        let result = sqlx::query(
            r#"
            UPDATE bets AS b
            SET points_earned = u.points
            FROM UNNEST($1::uuid[], $2::int4[]) AS u(bet_id, points)
            WHERE b.bet_id = u.bet_id
            "#,
        )
        .bind(&bet_ids)
        .bind(&points)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn league_totals(&self, league_id: Uuid) -> Result<Vec<UserLeagueTotals>> {
        let sql = format!(
            r#"
            SELECT
                b.user_id,
                COUNT(*) AS total_bets,
                COUNT(*) FILTER (WHERE b.points_earned > 0) AS correct_bets,
                COALESCE(SUM(b.points_earned), 0)::BIGINT AS total_points
            FROM bets b
            WHERE {IN_LEAGUE}
            GROUP BY b.user_id
            ORDER BY b.user_id
            "#
        );

        let totals = sqlx::query_as::<_, UserLeagueTotals>(&sql)
            .bind(league_id)
            .fetch_all(self.pool)
            .await?;

        Ok(totals)
    }

    pub async fn user_bets_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScoredBet>> {
        let bets = sqlx::query_as::<_, ScoredBet>(
            r#"
            SELECT b.bet_id, b.user_id, b.match_id, m.match_date, b.points_earned
            FROM bets b
            INNER JOIN matches m ON m.match_id = b.match_id
            WHERE b.user_id = $1
              AND m.match_date >= $2
              AND m.match_date < $3
            ORDER BY m.match_date, b.bet_id
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(bets)
    }

    pub async fn league_scored_bets(
        &self,
        league_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ScoredBet>> {
        let sql = format!(
            r#"
            SELECT b.bet_id, b.user_id, b.match_id, m.match_date, b.points_earned
            FROM bets b
            INNER JOIN matches m ON m.match_id = b.match_id
            WHERE {IN_LEAGUE}
              AND ($2::uuid IS NULL OR b.bet_id > $2)
            ORDER BY b.bet_id
            LIMIT $3
            "#
        );

        let bets = sqlx::query_as::<_, ScoredBet>(&sql)
            .bind(league_id)
            .bind(page.after)
            .bind(page.limit)
            .fetch_all(self.pool)
            .await?;

        Ok(bets)
    }

    pub async fn list_user_ids(&self, page: PageRequest) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM users
            WHERE ($1::uuid IS NULL OR user_id > $1)
            ORDER BY user_id
            LIMIT $2
            "#,
        )
        .bind(page.after)
        .bind(page.limit)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}
