// ABOUTME: Usage route reporting the tenant's monthly token consumption
// ABOUTME: Shows the plan cap, tokens used, tokens remaining and recent ledger entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::authenticate;
use crate::database::month_start;
use crate::resources::ServerResources;
use crate::services::quota::quota_status;
use founderhub_core::errors::AppError;
use founderhub_core::models::UsageRecord;

const DEFAULT_RECENT_LIMIT: i64 = 20;
const MAX_RECENT_LIMIT: i64 = 200;

/// Query parameters for the usage report
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Number of recent ledger entries to include
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Monthly usage report
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    /// Plan cap, absent when uncapped
    pub token_cap: Option<u64>,
    /// Tokens used this month
    pub tokens_used: u64,
    /// Tokens left this month, absent when uncapped
    pub tokens_remaining: Option<u64>,
    /// Start of the current billing month (ISO 8601)
    pub period_start: String,
    /// Most recent ledger entries
    pub recent: Vec<UsageRecord>,
}

/// Usage routes
pub struct UsageRoutes;

impl UsageRoutes {
    /// Create the usage routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/usage", get(Self::get_usage))
            .with_state(resources)
    }

    async fn get_usage(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<UsageQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let now = Utc::now();
        let status = quota_status(&resources.database, auth.tenant_id, now).await?;
        let limit = query
            .limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        let recent = resources.database.list_usage(auth.tenant_id, limit).await?;

        let response = UsageResponse {
            token_cap: status.cap,
            tokens_used: status.used,
            tokens_remaining: status.remaining(),
            period_start: month_start(now).to_rfc3339(),
            recent,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
