// ABOUTME: reqwest client for the OpenAI Assistants API (v2) personas and threads
// ABOUTME: Implements AssistantBackend with one HTTP request per operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{AssistantBackend, AssistantSpec};
use crate::constants::{defaults, service_names};
use founderhub_core::errors::{AppError, AppResult};

/// Header selecting the Assistants API version
const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Connection settings for the assistants service
#[derive(Clone)]
pub struct OpenAiAssistantsConfig {
    /// API base URL
    pub base_url: String,
    /// Static bearer credential
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAiAssistantsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAssistantsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

/// Assistants API client
pub struct OpenAiAssistantsClient {
    client: Client,
    config: OpenAiAssistantsConfig,
}

impl OpenAiAssistantsClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: OpenAiAssistantsConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn failure(message: impl Into<String>) -> AppError {
        AppError::external_service(service_names::ASSISTANT_BACKEND, message)
    }

    async fn post_create(&self, path: &str, body: serde_json::Value) -> AppResult<String> {
        let response = self
            .client
            .post(self.api_url(path))
            .bearer_auth(&self.config.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::failure(format!("POST /{path} failed: {e}")))?;

        let response = Self::ensure_success(response, path).await?;
        let created: CreatedObject = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("Malformed /{path} response: {e}")))?;
        if created.id.is_empty() {
            return Err(Self::failure(format!("/{path} returned an empty id")));
        }
        Ok(created.id)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let response = self
            .client
            .delete(self.api_url(path))
            .bearer_auth(&self.config.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .send()
            .await
            .map_err(|e| Self::failure(format!("DELETE /{path} failed: {e}")))?;
        Self::ensure_success(response, path).await?;
        Ok(())
    }

    async fn ensure_success(response: Response, path: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(Self::failure(format!("/{path} returned HTTP {status}: {snippet}")))
    }
}

#[async_trait]
impl AssistantBackend for OpenAiAssistantsClient {
    fn name(&self) -> &str {
        service_names::ASSISTANT_BACKEND
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> AppResult<String> {
        debug!(name = %spec.name, model = %spec.model, "Creating external assistant");
        self.post_create(
            "assistants",
            json!({
                "name": spec.name,
                "instructions": spec.instructions,
                "model": spec.model,
            }),
        )
        .await
    }

    async fn create_thread(&self) -> AppResult<String> {
        self.post_create("threads", json!({})).await
    }

    async fn delete_assistant(&self, assistant_id: &str) -> AppResult<()> {
        self.delete(&format!("assistants/{assistant_id}")).await
    }

    async fn delete_thread(&self, thread_id: &str) -> AppResult<()> {
        self.delete(&format!("threads/{thread_id}")).await
    }
}
