// ABOUTME: AI invocation gateway trying the GPU backend first, then the hosted backend
// ABOUTME: Bills exactly one usage record for the backend that served the generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # AI Invocation Gateway
//!
//! Every generation in the system goes through [`AiGateway::generate`]:
//!
//! 1. The primary (self-hosted GPU) backend is tried once, if configured.
//! 2. On any failure the secondary (hosted) backend is tried once.
//! 3. The serving backend's reported token total, or an estimate, is
//!    appended to the usage ledger.
//!
//! There is no other retry. When both attempts fail the caller gets a
//! `GenerationFailed` error and nothing is billed.

/// Token estimates for replies that arrive without usage figures
pub mod tokens;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::database::{Database, NewUsageRecord};
use crate::llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider};
use crate::logging::AppLogger;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{PersonaRole, TenantId, UsageSource};

pub use tokens::{billable_tokens, estimate_tokens};

/// One generation to perform
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Tenant billed for the call
    pub tenant_id: TenantId,
    /// Calling user, also the subject of signed backend tokens
    pub user_id: Uuid,
    /// Project the call concerns
    pub project_id: Option<Uuid>,
    /// Role selecting the model variant
    pub role: PersonaRole,
    /// Ledger source
    pub source: UsageSource,
    /// Optional system instructions
    pub system: Option<String>,
    /// Conversation, last message being the prompt
    pub messages: Vec<ChatMessage>,
}

impl GenerationRequest {
    /// Single-prompt request
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        user_id: Uuid,
        role: PersonaRole,
        source: UsageSource,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            project_id: None,
            role,
            source,
            system: None,
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    /// Attach a project
    #[must_use]
    pub const fn with_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Attach system instructions
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Replace the conversation
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }
}

/// Successful generation
#[derive(Debug, Clone)]
pub struct Generation {
    /// Generated text
    pub content: String,
    /// Backend that served it
    pub backend: String,
    /// Model that served it
    pub model: String,
    /// Tokens billed
    pub tokens_used: u32,
    /// Whether `tokens_used` came from the backend rather than the estimate
    pub usage_reported: bool,
}

/// Ordered, single-attempt fallback across inference backends
#[derive(Clone)]
pub struct AiGateway {
    primary: Option<Arc<dyn LlmProvider>>,
    secondary: Arc<dyn LlmProvider>,
    database: Arc<Database>,
    role_models: HashMap<String, String>,
}

impl AiGateway {
    /// Create a gateway
    ///
    /// `role_models` overrides the hosted backend's model per role.
    #[must_use]
    pub fn new(
        primary: Option<Arc<dyn LlmProvider>>,
        secondary: Arc<dyn LlmProvider>,
        database: Arc<Database>,
        role_models: HashMap<String, String>,
    ) -> Self {
        Self {
            primary,
            secondary,
            database,
            role_models,
        }
    }

    /// Name of the backend tried first
    #[must_use]
    pub fn first_backend(&self) -> &str {
        self.primary
            .as_deref()
            .map_or_else(|| self.secondary.name(), LlmProvider::name)
    }

    /// Generate text and record its usage
    ///
    /// # Errors
    ///
    /// `GenerationFailed` when every backend failed; a database error when the
    /// usage record cannot be written
    #[instrument(skip(self, request), fields(tenant = %request.tenant_id, role = %request.role, source = %request.source))]
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Generation> {
        let mut failures: Vec<(String, String)> = Vec::with_capacity(2);

        if let Some(primary) = &self.primary {
            let chat = Self::chat_request(request, primary.default_model());
            let started = Instant::now();
            match primary.complete(&chat).await {
                Ok(response) => return self.bill(primary.as_ref(), response, request, started).await,
                Err(e) => {
                    warn!(
                        backend = primary.name(),
                        error = %e,
                        "Primary inference backend failed, falling back"
                    );
                    failures.push((primary.name().to_owned(), e.message));
                }
            }
        }

        let model = self
            .role_models
            .get(request.role.as_str())
            .map_or(self.secondary.default_model(), String::as_str);
        let chat = Self::chat_request(request, model);
        let started = Instant::now();
        match self.secondary.complete(&chat).await {
            Ok(response) => self.bill(self.secondary.as_ref(), response, request, started).await,
            Err(e) => {
                warn!(backend = self.secondary.name(), error = %e, "Secondary inference backend failed");
                failures.push((self.secondary.name().to_owned(), e.message));
                Err(AppError::generation_failed(&failures))
            }
        }
    }

    fn chat_request(request: &GenerationRequest, model: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(request.messages.iter().cloned());
        ChatRequest::new(messages)
            .with_model(model)
            .with_user(request.user_id.to_string())
    }

    async fn bill(
        &self,
        provider: &dyn LlmProvider,
        response: ChatResponse,
        request: &GenerationRequest,
        started: Instant,
    ) -> AppResult<Generation> {
        let tokens_used = billable_tokens(response.usage.as_ref(), &response.content);
        if response.usage.is_none() && provider.capabilities().reports_usage() {
            warn!(
                backend = provider.name(),
                "Backend omitted token usage, billing an estimate"
            );
        }

        self.database
            .record_usage(&NewUsageRecord {
                tenant_id: request.tenant_id,
                user_id: request.user_id,
                project_id: request.project_id,
                source: request.source,
                backend: provider.name(),
                model: &response.model,
                tokens_used,
            })
            .await?;

        AppLogger::log_generation(
            &request.tenant_id.to_string(),
            provider.name(),
            &response.model,
            tokens_used,
            response.usage.is_some(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        Ok(Generation {
            usage_reported: response.usage.is_some(),
            content: response.content,
            backend: provider.name().to_owned(),
            model: response.model,
            tokens_used,
        })
    }
}
