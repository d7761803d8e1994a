//! # PostgreSQL Job Store
//!
//! Stores every variant in the `polyjob_jobs` table. The discriminant is kept
//! both in the `job_type` column and inside the JSONB `payload`, which holds
//! the serialized [`JobPayload`]. Rows are ordered by the `seq` column so that
//! bounded status reads are stable.
//!
//! Status writes use `WHERE id = ... AND status = <expected>`, which makes
//! each row update a compare-and-swap without an explicit transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{JobStore, StatusUpdate, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::{Job, JobId, JobPayload, JobStatus, JobType, NewJob};

const JOB_COLUMNS: &str = "id, name, status, payload, created_at, updated_at";

/// Job store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the database section of the configuration
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to job store: {}", e);
                StoreError::from_sqlx("connect", e)
            })?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::query("migrate", e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Row shape shared by every query returning jobs
#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    name: String,
    status: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<JobStatus>().map_err(StoreError::decode)?;
        let payload: JobPayload = serde_json::from_value(row.payload)?;
        Ok(Job {
            id: row.id,
            name: row.name,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            payload,
        })
    }
}

/// Decode rows of a multi-record read, logging and skipping bad ones
fn decode_rows(rows: Vec<JobRow>) -> Vec<Job> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Job::try_from(row) {
                Ok(job) => Some(job),
                Err(e) => {
                    error!(job_id = %id, "Skipping undecodable job row: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn known_job_types() -> Vec<&'static str> {
    JobType::ALL.iter().map(JobType::as_str).collect()
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, new_job), fields(name = %new_job.name))]
    async fn insert(&self, new_job: NewJob) -> StoreResult<Job> {
        let job_type = new_job.payload.job_type();
        let payload = serde_json::to_value(&new_job.payload)?;

        let query = format!(
            r#"
            INSERT INTO polyjob_jobs (id, job_type, name, status, payload, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', $4, NOW(), NOW())
            RETURNING {JOB_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(Uuid::new_v4())
            .bind(job_type.as_str())
            .bind(&new_job.name)
            .bind(payload)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("insert", e))?;

        let job = Job::try_from(row)?;
        debug!(job_id = %job.id, job_type = %job_type, "Inserted job row");
        Ok(job)
    }

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<Job>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM polyjob_jobs WHERE id = $1");

        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("find_by_id", e))?
            .map(Job::try_from)
            .transpose()
    }

    async fn find_by_status(&self, status: JobStatus, limit: usize) -> StoreResult<Vec<Job>> {
        // Variants this build cannot decode must not use up the limit
        let query = format!(
            r#"
            SELECT {JOB_COLUMNS} FROM polyjob_jobs
            WHERE status = $1 AND job_type = ANY($3)
            ORDER BY seq
            LIMIT $2
            "#
        );

        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(status.as_str())
            .bind(to_i64(limit as u64))
            .bind(known_job_types())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("find_by_status", e))?;

        Ok(decode_rows(rows))
    }

    async fn update_status_for_ids(
        &self,
        ids: &[JobId],
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<Vec<StatusUpdate>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            r#"
            UPDATE polyjob_jobs
            SET status = $3, updated_at = NOW()
            WHERE id = ANY($1) AND status = $2
            RETURNING id, updated_at
            "#,
        )
        .bind(ids)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx("update_status_for_ids", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, updated_at)| StatusUpdate { id, updated_at })
            .collect())
    }

    async fn update_status_for_id(
        &self,
        id: JobId,
        expected: JobStatus,
        new_status: JobStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE polyjob_jobs
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx("update_status_for_id", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_page(&self, offset: u64, limit: u64) -> StoreResult<Vec<Job>> {
        let query =
            format!("SELECT {JOB_COLUMNS} FROM polyjob_jobs ORDER BY seq LIMIT $1 OFFSET $2");

        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("find_page", e))?;

        Ok(decode_rows(rows))
    }

    async fn count(&self) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM polyjob_jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("count", e))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
