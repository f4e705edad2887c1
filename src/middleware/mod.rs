// ABOUTME: HTTP middleware for request tracing, request IDs, timeouts and CORS
// ABOUTME: Applied once around the merged API router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

/// Cross-origin policy for the web client
pub mod cors;
/// Request IDs, per-request spans and the request timeout
pub mod tracing;

// CORS configuration
pub use cors::setup_cors;

// Request tracing and correlation
pub use self::tracing::{create_request_span, with_request_tracing, REQUEST_ID_HEADER};
