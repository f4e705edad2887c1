// ABOUTME: Durable, table-backed job scheduler with a polling tokio worker
// ABOUTME: Jobs survive restarts; failures are retried with exponential backoff
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Job Scheduler
//!
//! Jobs are rows in `scheduled_jobs`. The worker polls for due `pending` rows,
//! claims each one with a conditional update, and dispatches it to the
//! [`JobHandler`] registered for its kind. Rows still `running` when the
//! process died are returned to the queue when the worker starts.

mod backoff;
mod handlers;

pub use backoff::RetryPolicy;
pub use handlers::{JobHandler, WebhookJobHandler};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::constants::defaults;
use crate::database::{Database, JobRecord};
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::TenantId;

/// Outcome counts of one poll
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    /// Jobs that succeeded
    pub completed: usize,
    /// Jobs re-queued for another attempt
    pub retried: usize,
    /// Jobs that failed permanently
    pub failed: usize,
}

/// Schedules jobs and runs the worker loop
#[derive(Clone)]
pub struct JobScheduler {
    database: Arc<Database>,
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    policy: RetryPolicy,
    config: SchedulerConfig,
}

impl JobScheduler {
    /// Scheduler with no handlers registered
    #[must_use]
    pub fn new(database: Arc<Database>, config: SchedulerConfig) -> Self {
        Self {
            database,
            handlers: HashMap::new(),
            policy: RetryPolicy::default(),
            config,
        }
    }

    /// Register a handler for its kind, replacing any previous one
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(handler.kind().to_owned(), handler);
        self
    }

    /// Override the retry delays
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Persist a job to run at `run_at`
    ///
    /// # Errors
    ///
    /// Invalid input when `run_at` is not in the future, the kind has no
    /// handler, or the handler rejects the payload
    pub async fn schedule(
        &self,
        tenant_id: TenantId,
        kind: &str,
        payload: Value,
        run_at: DateTime<Utc>,
    ) -> AppResult<JobRecord> {
        if run_at <= Utc::now() {
            return Err(AppError::invalid_input("run_at must be in the future"));
        }
        let handler = self
            .handlers
            .get(kind)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown job kind '{kind}'")))?;
        handler.validate(&payload)?;

        let job = self
            .database
            .insert_job(tenant_id, kind, &payload, run_at, self.config.max_attempts)
            .await?;
        info!(job_id = %job.id, kind, run_at = %job.run_at, "Job scheduled");
        Ok(job)
    }

    /// Cancel a pending job
    ///
    /// # Errors
    ///
    /// `NotFound` when the tenant has no pending job with this ID
    pub async fn cancel(&self, tenant_id: TenantId, job_id: Uuid) -> AppResult<()> {
        if self.database.cancel_job(tenant_id, job_id).await? {
            info!(job_id = %job_id, "Job cancelled");
            Ok(())
        } else {
            Err(AppError::not_found(format!("Pending job {job_id}")))
        }
    }

    /// A tenant's jobs
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<JobRecord>> {
        self.database.list_jobs(tenant_id).await
    }

    /// Claim and run every job due at `now`
    ///
    /// # Errors
    ///
    /// Returns an error only for database failures; job failures are recorded
    pub async fn run_due_once(&self, now: DateTime<Utc>) -> AppResult<PollSummary> {
        let jobs = self
            .database
            .claim_due_jobs(now, defaults::SCHEDULER_BATCH_SIZE)
            .await?;
        let mut summary = PollSummary::default();

        for job in jobs {
            let Some(handler) = self.handlers.get(&job.kind) else {
                warn!(job_id = %job.id, kind = %job.kind, "No handler for job kind");
                self.database
                    .fail_job(job.id, &format!("No handler for job kind '{}'", job.kind))
                    .await?;
                summary.failed += 1;
                continue;
            };

            match handler.run(&job).await {
                Ok(()) => {
                    self.database.complete_job(job.id).await?;
                    debug!(job_id = %job.id, "Job completed");
                    summary.completed += 1;
                }
                Err(e) if job.attempts < job.max_attempts => {
                    let delay = self.policy.delay_after(job.attempts);
                    let retry_at = now
                        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
                    warn!(
                        job_id = %job.id,
                        attempt = job.attempts,
                        retry_at = %retry_at,
                        error = %e,
                        "Job failed, retrying"
                    );
                    self.database.retry_job(job.id, retry_at, &e.to_string()).await?;
                    summary.retried += 1;
                }
                Err(e) => {
                    error!(job_id = %job.id, attempts = job.attempts, error = %e, "Job failed permanently");
                    self.database.fail_job(job.id, &e.to_string()).await?;
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Run the worker until `shutdown` flips to `true`
    ///
    /// # Errors
    ///
    /// Returns an error if interrupted jobs cannot be re-queued at start-up
    pub async fn run_worker(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> AppResult<()> {
        let requeued = self.database.requeue_interrupted_jobs().await?;
        if requeued > 0 {
            info!(requeued, "Re-queued jobs interrupted by a previous shutdown");
        }

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs.max(1)));
        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            handlers = self.handlers.len(),
            "Job scheduler worker started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_due_once(Utc::now()).await {
                        error!(error = %e, "Scheduler poll failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Job scheduler worker stopping");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
