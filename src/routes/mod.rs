// ABOUTME: Route module organization for the FounderHub REST API
// ABOUTME: Builds the full axum router from per-domain route groups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! Route module for FounderHub
//!
//! Each domain module contains only route definitions and thin handler
//! functions that authenticate the caller and delegate to the service layer.

/// KPI anomaly detection and decision log routes
pub mod analytics;
/// Persona team, chat and thread routes
pub mod assistants;
/// CRM lead, contact, note and task routes
pub mod crm;
/// Health check routes
pub mod health;
/// Idea CRUD, analysis and summary routes
pub mod ideas;
/// Job scheduler routes
pub mod scheduler;
/// Monthly usage routes
pub mod usage;

pub use analytics::AnalyticsRoutes;
pub use assistants::AssistantRoutes;
pub use crm::CrmRoutes;
pub use health::HealthRoutes;
pub use ideas::IdeaRoutes;
pub use scheduler::SchedulerRoutes;
pub use usage::UsageRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequest;
use axum::http::HeaderMap;
use axum::Router;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::constants::defaults;
use crate::middleware::{setup_cors, with_request_tracing};
use crate::resources::ServerResources;
use founderhub_core::errors::{AppError, AppResult};

/// Every route of the API, without middleware layers
pub fn api_router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(IdeaRoutes::routes(resources.clone()))
        .merge(AssistantRoutes::routes(resources.clone()))
        .merge(UsageRoutes::routes(resources.clone()))
        .merge(CrmRoutes::routes(resources.clone()))
        .merge(SchedulerRoutes::routes(resources.clone()))
        .merge(AnalyticsRoutes::routes(resources.clone()))
}

/// The API router wrapped in CORS, request IDs, tracing and the request timeout
pub fn build_app(resources: &Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors);
    with_request_tracing(
        api_router(resources),
        Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
    )
    .layer(cors)
}

/// Authenticate the caller from the `Authorization` header
pub(crate) fn authenticate(
    headers: &HeaderMap,
    resources: &ServerResources,
) -> AppResult<AuthContext> {
    resources.auth_manager.authenticate(headers)
}

/// JSON request body
///
/// Syntax errors, type mismatches and a missing `Content-Type` surface as
/// `INVALID_INPUT` in the standard error payload instead of axum's plain text.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Parse a UUID path segment
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_input(format!("Invalid {what} ID: {raw}")))
}
