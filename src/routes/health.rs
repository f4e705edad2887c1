// ABOUTME: Liveness endpoint for load balancers and container health checks
// ABOUTME: Unauthenticated and never touches the database or the inference backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::constants::service_names;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        status: "healthy",
        service: service_names::FOUNDERHUB_SERVER,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `GET /health`
pub struct HealthRoutes;

impl HealthRoutes {
    /// Router for the liveness check
    pub fn routes() -> Router {
        Router::new().route("/health", get(liveness))
    }
}
