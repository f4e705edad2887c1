// ABOUTME: Durable job queue table backing the scheduler
// ABOUTME: Jobs survive restarts; claiming flips pending rows to running one at a time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::TenantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, timestamp_now, to_u32, Database};

/// Lifecycle state of a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for its run time
    Pending,
    /// Claimed by a worker
    Running,
    /// Handler succeeded
    Completed,
    /// Handler failed on its last allowed attempt
    Failed,
    /// Cancelled before it ran
    Cancelled,
}

impl JobStatus {
    /// Column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::database(format!("Unknown job status: {other}"))),
        }
    }
}

/// Stored scheduled job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job ID
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Handler name
    pub kind: String,
    /// Handler input
    pub payload: Value,
    /// Earliest time the job may run
    pub run_at: DateTime<Utc>,
    /// Current state
    pub status: JobStatus,
    /// Attempts made so far
    pub attempts: u32,
    /// Attempts allowed before the job fails
    pub max_attempts: u32,
    /// Error from the most recent failed attempt
    pub last_error: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub updated_at: DateTime<Utc>,
}

const JOB_COLUMNS: &str = "id, tenant_id, kind, payload, run_at, status, attempts, max_attempts, \
     last_error, created_at, updated_at";

fn job_from_row(r: &SqliteRow) -> AppResult<JobRecord> {
    let tenant: String = r.try_get("tenant_id")?;
    let payload: String = r.try_get("payload")?;
    let status: String = r.try_get("status")?;
    Ok(JobRecord {
        id: parse_uuid(r.try_get("id")?)?,
        tenant_id: TenantId::from_uuid(parse_uuid(&tenant)?),
        kind: r.try_get("kind")?,
        payload: serde_json::from_str(&payload)?,
        run_at: parse_timestamp(r.try_get("run_at")?)?,
        status: status.parse()?,
        attempts: to_u32(r.try_get("attempts")?),
        max_attempts: to_u32(r.try_get("max_attempts")?),
        last_error: r.try_get("last_error")?,
        created_at: parse_timestamp(r.try_get("created_at")?)?,
        updated_at: parse_timestamp(r.try_get("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_jobs(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS scheduled_jobs (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                run_at TEXT NOT NULL,
                status TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                max_attempts INTEGER NOT NULL,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_scheduled_jobs_due ON scheduled_jobs(status, run_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a new pending job
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_job(
        &self,
        tenant_id: TenantId,
        kind: &str,
        payload: &Value,
        run_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> AppResult<JobRecord> {
        let id = Uuid::new_v4();
        let now = timestamp_now();

        sqlx::query(
            r"
            INSERT INTO scheduled_jobs (id, tenant_id, kind, payload, run_at, status, attempts, max_attempts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', 0, $6, $7, $7)
            ",
        )
        .bind(id.to_string())
        .bind(tenant_id.to_string())
        .bind(kind)
        .bind(serde_json::to_string(payload)?)
        .bind(format_timestamp(run_at))
        .bind(i64::from(max_attempts))
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert job: {e}")))?;

        self.get_job(id)
            .await?
            .ok_or_else(|| AppError::internal("Job missing after insert"))
    }

    /// Get a job by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_job(&self, job_id: Uuid) -> AppResult<Option<JobRecord>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM scheduled_jobs WHERE id = $1"))
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get job: {e}")))?;

        row.as_ref().map(job_from_row).transpose()
    }

    /// List a tenant's jobs ordered by run time
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_jobs(&self, tenant_id: TenantId) -> AppResult<Vec<JobRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs WHERE tenant_id = $1 ORDER BY run_at ASC"
        ))
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list jobs: {e}")))?;

        rows.iter().map(job_from_row).collect()
    }

    /// Cancel a pending job; returns false when no pending job matched
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn cancel_job(&self, tenant_id: TenantId, job_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE scheduled_jobs SET status = 'cancelled', updated_at = $1
            WHERE id = $2 AND tenant_id = $3 AND status = 'pending'
            ",
        )
        .bind(timestamp_now())
        .bind(job_id.to_string())
        .bind(tenant_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to cancel job: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Claim up to `limit` due jobs, moving them to `running` and counting the attempt
    ///
    /// A job is returned only if this call flipped it from `pending`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn claim_due_jobs(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<JobRecord>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT id FROM scheduled_jobs
            WHERE status = 'pending' AND run_at <= $1
            ORDER BY run_at ASC
            LIMIT $2
            ",
        )
        .bind(format_timestamp(now))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find due jobs: {e}")))?;

        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            let result = sqlx::query(
                r"
                UPDATE scheduled_jobs SET status = 'running', attempts = attempts + 1, updated_at = $1
                WHERE id = $2 AND status = 'pending'
                ",
            )
            .bind(timestamp_now())
            .bind(&id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to claim job: {e}")))?;

            if result.rows_affected() == 1 {
                if let Some(job) = self.get_job(parse_uuid(&id)?).await? {
                    claimed.push(job);
                }
            }
        }
        Ok(claimed)
    }

    /// Mark a running job completed
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn complete_job(&self, job_id: Uuid) -> AppResult<()> {
        self.set_job_state(job_id, JobStatus::Completed, None, None)
            .await
    }

    /// Put a failed job back in the queue for another attempt
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn retry_job(&self, job_id: Uuid, run_at: DateTime<Utc>, error: &str) -> AppResult<()> {
        self.set_job_state(job_id, JobStatus::Pending, Some(run_at), Some(error))
            .await
    }

    /// Mark a job permanently failed
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn fail_job(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.set_job_state(job_id, JobStatus::Failed, None, Some(error))
            .await
    }

    async fn set_job_state(
        &self,
        job_id: Uuid,
        status: JobStatus,
        run_at: Option<DateTime<Utc>>,
        error: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE scheduled_jobs
            SET status = $1, run_at = COALESCE($2, run_at), last_error = COALESCE($3, last_error), updated_at = $4
            WHERE id = $5
            ",
        )
        .bind(status.as_str())
        .bind(run_at.map(format_timestamp))
        .bind(error)
        .bind(timestamp_now())
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update job state: {e}")))?;

        Ok(())
    }

    /// Return jobs left `running` by a previous process to the queue
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn requeue_interrupted_jobs(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE scheduled_jobs SET status = 'pending', updated_at = $1 WHERE status = 'running'",
        )
        .bind(timestamp_now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to requeue interrupted jobs: {e}")))?;

        Ok(result.rows_affected())
    }
}
