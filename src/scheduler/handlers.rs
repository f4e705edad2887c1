// ABOUTME: Job handlers executed by the scheduler worker, keyed by job kind
// ABOUTME: Ships the webhook handler that POSTs a stored body to a stored URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::{defaults, service_names};
use crate::database::JobRecord;
use founderhub_core::errors::{AppError, AppResult};

/// Executes one kind of scheduled job
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Job kind this handler serves
    fn kind(&self) -> &str;

    /// Reject payloads that could never run
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error describing the problem
    fn validate(&self, _payload: &Value) -> AppResult<()> {
        Ok(())
    }

    /// Run the job once
    async fn run(&self, job: &JobRecord) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    url: String,
    #[serde(default)]
    body: Value,
}

impl WebhookPayload {
    fn parse(payload: &Value) -> AppResult<Self> {
        let parsed: Self = serde_json::from_value(payload.clone())
            .map_err(|e| AppError::invalid_input(format!("Invalid webhook payload: {e}")))?;
        if !(parsed.url.starts_with("http://") || parsed.url.starts_with("https://")) {
            return Err(AppError::invalid_input("Webhook url must be http(s)"));
        }
        Ok(parsed)
    }
}

/// POSTs `payload.body` as JSON to `payload.url`
pub struct WebhookJobHandler {
    client: Client,
}

impl WebhookJobHandler {
    /// Create a handler with the default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(defaults::WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JobHandler for WebhookJobHandler {
    fn kind(&self) -> &str {
        service_names::WEBHOOK
    }

    fn validate(&self, payload: &Value) -> AppResult<()> {
        WebhookPayload::parse(payload).map(|_| ())
    }

    async fn run(&self, job: &JobRecord) -> AppResult<()> {
        let payload = WebhookPayload::parse(&job.payload)?;
        debug!(job_id = %job.id, url = %payload.url, "Delivering webhook");

        let response = self
            .client
            .post(&payload.url)
            .json(&payload.body)
            .send()
            .await
            .map_err(|e| AppError::external_service(service_names::WEBHOOK, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::external_service(
                service_names::WEBHOOK,
                format!("{} returned HTTP {status}", payload.url),
            ))
        }
    }
}
