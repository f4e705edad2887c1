// ABOUTME: Cross-origin policy for the founder web client
// ABOUTME: Built once from CorsConfig and layered over the whole router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::REQUEST_ID_HEADER;
use crate::config::environment::CorsConfig;

const API_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// CORS layer for `CORS_ALLOWED_ORIGINS`
///
/// `*` anywhere in the list, or a list with no usable origin, opens the API
/// to every origin. The request id header is exposed so the browser can
/// report it alongside errors.
#[must_use]
pub fn setup_cors(config: &CorsConfig) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    CorsLayer::new()
        .allow_origin(origin_policy(&config.allowed_origins))
        .allow_methods(API_METHODS)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            request_id.clone(),
        ])
        .expose_headers([request_id])
}

fn origin_policy(origins: &[String]) -> AllowOrigin {
    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
        if origin == "*" {
            return AllowOrigin::any();
        }
        if let Ok(value) = HeaderValue::from_str(origin) {
            allowed.push(value);
        }
    }

    if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    }
}
