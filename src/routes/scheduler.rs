// ABOUTME: Scheduler route handlers to schedule, list and cancel durable jobs
// ABOUTME: Jobs run later on the background worker, not in the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{authenticate, parse_id, ApiJson};
use crate::database::JobRecord;
use crate::resources::ServerResources;
use founderhub_core::errors::AppError;

/// Request to schedule a job
#[derive(Debug, Deserialize)]
pub struct ScheduleJobRequest {
    /// Handler kind, e.g. `webhook`
    pub kind: String,
    /// Handler input
    #[serde(default)]
    pub payload: Value,
    /// When to run; must be in the future
    pub run_at: DateTime<Utc>,
}

/// Response for listing jobs
#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    /// Jobs ordered by run time
    pub jobs: Vec<JobRecord>,
    /// Total count
    pub total: usize,
}

/// Scheduler routes
pub struct SchedulerRoutes;

impl SchedulerRoutes {
    /// Create all scheduler routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/scheduler/jobs",
                post(Self::schedule_job).get(Self::list_jobs),
            )
            .route("/api/scheduler/jobs/:job_id", delete(Self::cancel_job))
            .with_state(resources)
    }

    async fn schedule_job(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<ScheduleJobRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let job = resources
            .scheduler
            .schedule(auth.tenant_id, &request.kind, request.payload, request.run_at)
            .await?;
        Ok((StatusCode::CREATED, Json(job)).into_response())
    }

    async fn list_jobs(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let jobs = resources.scheduler.list(auth.tenant_id).await?;
        let total = jobs.len();
        Ok((StatusCode::OK, Json(JobListResponse { jobs, total })).into_response())
    }

    async fn cancel_job(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(job_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let job_id = parse_id(&job_id, "job")?;
        resources.scheduler.cancel(auth.tenant_id, job_id).await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
