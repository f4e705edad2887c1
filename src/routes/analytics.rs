// ABOUTME: Analytics route handlers for KPI anomaly checks and the decision log
// ABOUTME: Each check is evaluated by the anomaly detector and recorded for the tenant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{authenticate, ApiJson};
use crate::analytics::AnomalyReport;
use crate::database::{DecisionLogRecord, NewDecisionLog};
use crate::resources::ServerResources;
use founderhub_core::errors::AppError;

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 500;

/// Request to check a KPI series
#[derive(Debug, Deserialize)]
pub struct AnomalyCheckRequest {
    /// Agent performing the check
    pub agent: String,
    /// KPI name
    pub kpi: String,
    /// Series, oldest first, latest value last
    pub values: Vec<f64>,
}

/// Result of a KPI check
#[derive(Debug, Serialize)]
pub struct AnomalyCheckResponse {
    /// Detector statistics and verdict
    #[serde(flatten)]
    pub report: AnomalyReport,
    /// Stored decision log entry
    pub decision: DecisionLogRecord,
}

/// Query parameters for the decision log
#[derive(Debug, Deserialize)]
pub struct DecisionLogQuery {
    /// Maximum entries to return
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Response for listing decision logs
#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionLogListResponse {
    /// Entries, newest first
    pub decisions: Vec<DecisionLogRecord>,
}

/// Analytics routes
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create all analytics routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/analytics/anomalies",
                post(Self::check_kpi).get(Self::list_decisions),
            )
            .with_state(resources)
    }

    async fn check_kpi(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<AnomalyCheckRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        if request.agent.trim().is_empty() {
            return Err(AppError::missing_field("agent"));
        }
        if request.kpi.trim().is_empty() {
            return Err(AppError::missing_field("kpi"));
        }
        if request.values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::invalid_input("KPI values must be finite numbers"));
        }

        let report = resources
            .anomaly_detector
            .detect(&request.values)
            .ok_or_else(|| AppError::invalid_input("At least 3 KPI values are required"))?;

        let reason = format!(
            "{} deviates {:.2} from mean {:.2} (threshold {:.2})",
            request.kpi, report.deviation, report.average, report.threshold
        );
        let decision = resources
            .database
            .insert_decision_log(
                auth.tenant_id,
                &NewDecisionLog {
                    agent: request.agent.trim(),
                    kpi: request.kpi.trim(),
                    current: report.current,
                    average: report.average,
                    std_dev: report.std_dev,
                    deviation: report.deviation,
                    threshold: report.threshold,
                    status: report.status.as_str(),
                    reason: &reason,
                },
            )
            .await?;

        Ok((StatusCode::OK, Json(AnomalyCheckResponse { report, decision })).into_response())
    }

    async fn list_decisions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<DecisionLogQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        let decisions = resources
            .database
            .list_decision_logs(auth.tenant_id, limit)
            .await?;
        Ok((StatusCode::OK, Json(DecisionLogListResponse { decisions })).into_response())
    }
}
