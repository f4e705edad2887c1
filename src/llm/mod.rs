// ABOUTME: LLM provider abstraction layer for pluggable inference backends
// ABOUTME: Defines the contract the gateway uses for the GPU and hosted chat backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Inference Backends
//!
//! Both inference backends speak the `OpenAI` chat completions protocol and
//! differ only in how requests are authenticated, so a single
//! [`OpenAiCompatibleProvider`] serves both. The [`LlmProvider`] trait is the
//! seam the [`AiGateway`](crate::gateway::AiGateway) calls through, which lets
//! tests substitute scripted backends.

mod openai_compatible;
mod signing;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider, ProviderAuth};
pub use signing::{InferenceClaims, InferenceTokenSigner};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use founderhub_core::errors::AppError;

bitflags::bitflags! {
    /// What a backend is expected to do
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Responses carry a `usage` block
        const USAGE_REPORTING = 1;
        /// Each request carries a freshly signed token
        const SIGNED_REQUESTS = 1 << 1;
    }
}

impl LlmCapabilities {
    /// Whether a missing `usage` block is unexpected
    #[must_use]
    pub const fn reports_usage(self) -> bool {
        self.contains(Self::USAGE_REPORTING)
    }
}

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions
    System,
    /// Founder
    User,
    /// Persona
    Assistant,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker
    pub role: MessageRole,
    /// Text
    pub content: String,
}

impl ChatMessage {
    /// Instruction turn
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Founder turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Persona turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation, oldest first
    pub messages: Vec<ChatMessage>,
    /// Model override; the backend default otherwise
    pub model: Option<String>,
    /// Calling user, forwarded as `user` and used as the signed token subject
    pub user_id: Option<String>,
}

impl ChatRequest {
    /// Request for `messages` on the default model
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            user_id: None,
        }
    }

    /// Use `model`
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attribute the call to `user_id`
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A completed chat call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated text
    pub content: String,
    /// Model that answered
    pub model: String,
    /// Reported usage, absent for backends that do not count tokens
    pub usage: Option<TokenUsage>,
    /// Why generation stopped
    pub finish_reason: Option<String>,
}

/// Token counts reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: u32,
    /// Billable total
    pub total_tokens: u32,
}

/// A chat completion backend
///
/// `complete` makes exactly one upstream call. Fallback belongs to the gateway.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Name recorded in the usage ledger, e.g. `gpu` or `openai`
    fn name(&self) -> &str;

    /// Expected backend behavior
    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when the request names none
    fn default_model(&self) -> &str;

    /// Run one chat completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}
