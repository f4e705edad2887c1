// ABOUTME: External persona (assistant) and conversation (thread) provider abstraction
// ABOUTME: Hosts the HTTP client, instruction rendering and the session resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Assistant Sessions
//!
//! Personas ("CEO", "CFO", ...) live in an external assistants service. Each
//! `(tenant, user, project, role)` gets one persona and one conversation
//! thread, created lazily by the [`SessionResolver`] and reused afterwards.

mod client;
/// Persona instruction templates and placeholder rendering
pub mod instructions;
mod resolver;

pub use client::{OpenAiAssistantsClient, OpenAiAssistantsConfig};
pub use resolver::SessionResolver;

use async_trait::async_trait;
use serde::Serialize;

use founderhub_core::errors::AppResult;

/// Everything needed to create an external persona
#[derive(Debug, Clone, Serialize)]
pub struct AssistantSpec {
    /// Display name, e.g. `"Acme CEO"`
    pub name: String,
    /// System instructions
    pub instructions: String,
    /// Model the persona runs on
    pub model: String,
}

/// External persona and conversation provider
///
/// Creation calls are attempted once; callers decide what to do on failure.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Provider name for logs and errors
    fn name(&self) -> &str;

    /// Create a persona, returning its opaque handle
    async fn create_assistant(&self, spec: &AssistantSpec) -> AppResult<String>;

    /// Create an empty conversation, returning its opaque handle
    async fn create_thread(&self) -> AppResult<String>;

    /// Delete a persona
    async fn delete_assistant(&self, assistant_id: &str) -> AppResult<()>;

    /// Delete a conversation
    async fn delete_thread(&self, thread_id: &str) -> AppResult<()>;
}
