use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::LeagueReportRecord;

pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        league_id: Uuid,
        report_type: &str,
        data: &serde_json::Value,
    ) -> Result<LeagueReportRecord> {
        let report = sqlx::query_as::<_, LeagueReportRecord>(
            r#"
            INSERT INTO league_reports (league_id, report_type, data)
            VALUES ($1, $2, $3)
            RETURNING report_id, league_id, report_type, data, created_at
            "#,
        )
        .bind(league_id)
        .bind(report_type)
        .bind(data)
        .fetch_one(self.pool)
        .await?;

        Ok(report)
    }
}
