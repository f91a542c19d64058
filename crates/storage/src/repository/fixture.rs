use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::common::PageRequest;
use crate::error::Result;
use crate::models::Match;

/// Read access to leagues and the matches reachable from them.
pub struct FixtureRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FixtureRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn league_exists(&self, league_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM leagues WHERE league_id = $1)",
        )
        .bind(league_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_league_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT league_id FROM leagues ORDER BY league_id")
            .fetch_all(self.pool)
            .await?;

        Ok(ids)
    }

    /// A match linked to the league through several competitions is still
    /// returned once.
    pub async fn league_matches(&self, league_id: Uuid, page: PageRequest) -> Result<Vec<Match>> {
        let matches = sqlx::query_as::<_, Match>(
            r#"
            SELECT m.match_id, m.round_id, m.match_date, m.home_score, m.away_score, m.is_cancelled
            FROM matches m
            WHERE EXISTS (
                SELECT 1
                FROM rounds r
                INNER JOIN competition_leagues cl ON cl.competition_id = r.competition_id
                WHERE r.round_id = m.round_id AND cl.league_id = $1
            )
              AND ($2::uuid IS NULL OR m.match_id > $2)
            ORDER BY m.match_id
            LIMIT $3
            "#,
        )
        .bind(league_id)
        .bind(page.after)
        .bind(page.limit)
        .fetch_all(self.pool)
        .await?;

        Ok(matches)
    }
}
