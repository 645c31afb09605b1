// Postgres persistence for saved analyses.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use painpoint_common::{Analysis, IdeaAnalysis, SavedAnalysis};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{clamp_limit, AnalysisStore};

/// A row from the analyses table.
#[derive(Debug, sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    title: String,
    analysis: Json<Analysis>,
    market_analysis: Json<BTreeMap<String, IdeaAnalysis>>,
}

impl From<AnalysisRow> for SavedAnalysis {
    fn from(row: AnalysisRow) -> Self {
        SavedAnalysis {
            id: row.id,
            created_at: row.created_at,
            title: row.title,
            analysis: row.analysis.0,
            market_analysis: row.market_analysis.0,
        }
    }
}

#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Analysis store migrations applied");
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn insert(&self, title: &str, analysis: &Analysis) -> Result<SavedAnalysis> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO analyses (title, analysis, market_analysis)
            VALUES ($1, $2, '{}'::jsonb)
            RETURNING id, created_at, title, analysis, market_analysis
            "#,
        )
        .bind(title)
        .bind(Json(analysis))
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %row.id, title, "Saved analysis");
        Ok(row.into())
    }

    async fn list(&self, limit: i64) -> Result<Vec<SavedAnalysis>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT id, created_at, title, analysis, market_analysis
            FROM analyses
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SavedAnalysis::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SavedAnalysis>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT id, created_at, title, analysis, market_analysis
            FROM analyses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SavedAnalysis::from))
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<Option<SavedAnalysis>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            UPDATE analyses SET title = $2
            WHERE id = $1
            RETURNING id, created_at, title, analysis, market_analysis
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SavedAnalysis::from))
    }

    async fn put_market_analysis(
        &self,
        id: Uuid,
        idea: &str,
        research: &IdeaAnalysis,
    ) -> Result<Option<SavedAnalysis>> {
        // jsonb_set on the single key so concurrent research on other ideas survives.
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            UPDATE analyses
            SET market_analysis = jsonb_set(market_analysis, ARRAY[$2::text], $3, true)
            WHERE id = $1
            RETURNING id, created_at, title, analysis, market_analysis
            "#,
        )
        .bind(id)
        .bind(idea)
        .bind(Json(research))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SavedAnalysis::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
