// ABOUTME: In-process request builder for driving the FounderHub router in tests
// ABOUTME: Sends one request through tower's oneshot and buffers the whole response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, request, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower::ServiceExt;

/// A request under construction
pub struct AxumTestRequest {
    parts: request::Builder,
    body: Body,
}

impl AxumTestRequest {
    fn with_method(method: Method, uri: &str) -> Self {
        Self {
            parts: Request::builder().method(method).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::with_method(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::with_method(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::with_method(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::with_method(Method::DELETE, uri)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.parts = self.parts.header(name, value);
        self
    }

    /// Authenticate as the holder of `token`
    pub fn bearer(self, token: &str) -> Self {
        let value = format!("Bearer {token}");
        self.header(header::AUTHORIZATION.as_str(), &value)
    }

    /// Attach a JSON payload
    pub fn json<T: Serialize>(mut self, payload: &T) -> Self {
        let bytes = serde_json::to_vec(payload).expect("payload serializes");
        self.body = Body::from(bytes);
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Run the request through a clone of the router
    pub async fn send(self, router: Router) -> AxumTestResponse {
        let request = self.parts.body(self.body).expect("valid request");
        let response = router.oneshot(request).await.expect("router is infallible");
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, usize::MAX).await.expect("readable body");

        AxumTestResponse {
            status: parts.status,
            headers: parts.headers,
            body: body.to_vec(),
        }
    }
}

/// A fully buffered response
pub struct AxumTestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl AxumTestResponse {
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        let value = self.headers.get(name)?;
        value.to_str().ok().map(ToOwned::to_owned)
    }

    pub fn json<T: DeserializeOwned>(self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(self) -> String {
        String::from_utf8(self.body).expect("utf-8 body")
    }
}
