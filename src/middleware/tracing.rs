// ABOUTME: Request tracing middleware for correlation and structured logging
// ABOUTME: Generates request IDs and opens one span per HTTP request carrying that ID
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

/// Header carrying the correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create a tracing span for an HTTP request
///
/// The request ID is read from `x-request-id`, which `SetRequestIdLayer`
/// fills in before this runs when the caller did not send one.
pub fn create_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        tenant_id = tracing::field::Empty,
        status_code = tracing::field::Empty,
    )
}

/// Wrap a router with request IDs, per-request spans and a whole-request timeout
///
/// Layer order matters: the ID is set outermost so the trace span and the
/// propagated response header both see it.
#[must_use]
pub fn with_request_tracing(router: Router, timeout: Duration) -> Router {
    let header = http::HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(PropagateRequestIdLayer::new(header.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
        .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
}
