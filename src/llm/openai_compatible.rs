// ABOUTME: OpenAI-compatible chat completion provider used for both inference backends
// ABOUTME: Authenticates with a static bearer key or a freshly signed per-request token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # `OpenAI`-Compatible Provider
//!
//! One implementation serves both inference backends:
//!
//! - the self-hosted GPU server (vLLM-style `OpenAI` API), authenticated with a
//!   short-lived HS256 token minted for every request, and
//! - the hosted `OpenAI` API, authenticated with a static bearer key.
//!
//! Each `complete` call makes exactly one HTTP request. Transport errors,
//! timeouts, non-2xx statuses and malformed bodies all surface as
//! `ExternalServiceError` so the gateway can treat them uniformly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponse, InferenceTokenSigner, LlmCapabilities, LlmProvider,
    TokenUsage,
};
use crate::config::{GpuBackendConfig, OpenAiConfig};
use crate::constants::{defaults, service_names};
use founderhub_core::errors::AppError;

/// Subject of signed tokens for calls without a user
const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Longest upstream error body echoed into an error message
const ERROR_SNIPPET_CHARS: usize = 200;

// Wire format

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Deserialize)]
struct CompletionReply {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamError {
    error: UpstreamErrorDetail,
}

#[derive(Deserialize)]
struct UpstreamErrorDetail {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// How requests to a backend are authenticated
#[derive(Clone)]
pub enum ProviderAuth {
    /// Static bearer credential
    Bearer(String),
    /// Fresh HS256 token per request, subject = calling user
    SignedToken(Arc<InferenceTokenSigner>),
}

impl std::fmt::Debug for ProviderAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Self::SignedToken(signer) => f.debug_tuple("SignedToken").field(signer).finish(),
        }
    }
}

/// Connection settings for one backend
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// API base URL, e.g. <https://api.openai.com/v1>
    pub base_url: String,
    /// Request authentication
    pub auth: ProviderAuth,
    /// Model used when a request names none
    pub default_model: String,
    /// Backend name recorded in the usage ledger
    pub provider_name: String,
    /// Expected backend behavior
    pub capabilities: LlmCapabilities,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl OpenAiCompatibleConfig {
    /// Self-hosted GPU backend
    #[must_use]
    pub fn gpu(config: &GpuBackendConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            auth: ProviderAuth::SignedToken(Arc::new(InferenceTokenSigner::new(
                config.signing_secret.as_bytes(),
                config.token_ttl_secs,
            ))),
            default_model: config.model.clone(),
            provider_name: service_names::GPU_BACKEND.to_owned(),
            capabilities: LlmCapabilities::SIGNED_REQUESTS,
            request_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Hosted `OpenAI` backend
    #[must_use]
    pub fn openai(config: &OpenAiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            auth: ProviderAuth::Bearer(config.api_key.clone()),
            default_model: config.model.clone(),
            provider_name: service_names::OPENAI_BACKEND.to_owned(),
            capabilities: LlmCapabilities::USAGE_REPORTING,
            request_timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Chat completions over HTTP
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder, subject: &str) -> Result<RequestBuilder, AppError> {
        Ok(match &self.config.auth {
            ProviderAuth::Bearer(key) => request.bearer_auth(key),
            ProviderAuth::SignedToken(signer) => request.bearer_auth(signer.sign(subject)?),
        })
    }

    fn failure(&self, message: impl Into<String>) -> AppError {
        AppError::external_service(&self.config.provider_name, message)
    }

    fn status_error(&self, status: StatusCode, body: &str) -> AppError {
        if let Ok(upstream) = serde_json::from_str::<UpstreamError>(body) {
            let kind = upstream.error.kind.as_deref().unwrap_or("unknown");
            return self.failure(format!("HTTP {status} ({kind}): {}", upstream.error.message));
        }
        let snippet: String = body.chars().take(ERROR_SNIPPET_CHARS).collect();
        self.failure(format!("HTTP {status}: {snippet}"))
    }

    fn transport_error(&self, e: &reqwest::Error) -> AppError {
        if e.is_timeout() {
            self.failure(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            self.failure(format!("Cannot connect to {}: {e}", self.config.base_url))
        } else {
            self.failure(format!("Request failed: {e}"))
        }
    }

    fn into_response(&self, reply: CompletionReply, model: &str) -> Result<ChatResponse, AppError> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.failure("Response contained no choices"))?;
        let content = choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| self.failure("Response contained an empty completion"))?;

        Ok(ChatResponse {
            content,
            model: reply.model.unwrap_or_else(|| model.to_owned()),
            usage: reply.usage,
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.provider_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(backend = %self.config.provider_name))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.config.default_model);
        let body = CompletionBody {
            model,
            messages: &request.messages,
            stream: false,
            user: request.user_id.as_deref(),
        };
        debug!(model, messages = body.messages.len(), "Sending chat completion");

        let http_request = self.client.post(self.completions_url()).json(&body);
        let response = self
            .authorize(
                http_request,
                request.user_id.as_deref().unwrap_or(ANONYMOUS_SUBJECT),
            )?
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.failure(format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(self.status_error(status, &text));
        }

        let reply: CompletionReply = serde_json::from_str(&text)
            .map_err(|e| self.failure(format!("Malformed response: {e}")))?;
        let response = self.into_response(reply, model)?;
        debug!(
            chars = response.content.len(),
            usage_reported = response.usage.is_some(),
            "Chat completion received"
        );
        Ok(response)
    }
}
