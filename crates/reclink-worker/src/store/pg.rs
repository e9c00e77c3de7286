//! PostgreSQL job store
//!
//! Jobs live in the `link_jobs` table: the `config` document and the
//! accumulated import identifiers as JSONB, the state as text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use reclink_common::{Job, JobState};

use super::JobStore;

/// Job store over the `link_jobs` table
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn get_one(&self, state: JobState) -> Result<Option<Job>> {
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            SELECT id, state, config, import_ids, created_at, updated_at
            FROM link_jobs
            WHERE state = $1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up job by state")?;

        row.map(Job::try_from).transpose()
    }

    async fn set_state(&self, job_id: Uuid, state: JobState) -> Result<()> {
        sqlx::query("UPDATE link_jobs SET state = $1, updated_at = NOW() WHERE id = $2")
            .bind(state.as_str())
            .bind(job_id)
            .execute(&self.pool)
            .await
            .context("Failed to update job state")?;

        Ok(())
    }

    async fn append_identifiers(&self, job_id: Uuid, identifiers: &[String]) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE link_jobs
            SET import_ids = import_ids || $1::jsonb, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(serde_json::to_value(identifiers).context("Failed to encode import identifiers")?)
        .bind(job_id)
        .execute(&self.pool)
        .await
        .context("Failed to append import identifiers")?;

        Ok(())
    }
}

// Helper struct for sqlx query_as
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    state: String,
    config: serde_json::Value,
    import_ids: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = anyhow::Error;

    fn try_from(row: JobRow) -> Result<Self> {
        let state: JobState = row
            .state
            .parse()
            .with_context(|| format!("job {} carries an unknown state", row.id))?;
        let config = serde_json::from_value(row.config)
            .with_context(|| format!("job {} carries a malformed config document", row.id))?;
        let import_ids = serde_json::from_value(row.import_ids)
            .with_context(|| format!("job {} carries malformed import identifiers", row.id))?;

        Ok(Job {
            job_id: row.id,
            state,
            config,
            import_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
