// ABOUTME: Persona chat: resolve the session, enforce quota, generate and persist the exchange
// ABOUTME: Replays the last messages with the same persona as conversation context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::quota::{ensure_not_exhausted, ensure_within_cap, quota_status, remaining_after};
use crate::assistants::SessionResolver;
use crate::database::{ChatLogRecord, Database};
use crate::gateway::{AiGateway, GenerationRequest};
use crate::llm::ChatMessage;
use founderhub_core::constants::CHAT_HISTORY_WINDOW;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{PersonaRole, SessionKey, TenantId, UsageSource};

/// Chat log speaker for founder messages
pub const SPEAKER_USER: &str = "user";
/// Chat log speaker for persona replies
pub const SPEAKER_ASSISTANT: &str = "assistant";

/// Result of one persona chat turn
#[derive(Debug, Clone, Serialize)]
pub struct PersonaChatReply {
    /// Persona reply
    pub reply: String,
    /// Role that answered
    pub role: String,
    /// Tokens billed for the reply
    pub tokens_used: u32,
    /// Tokens left this month, absent when uncapped
    pub remaining_tokens: Option<u64>,
    /// Backend that served the reply
    pub backend: String,
    /// External persona handle
    pub assistant_id: String,
    /// External conversation handle
    pub thread_id: String,
}

/// One founder message addressed to a persona
#[derive(Debug, Clone)]
pub struct PersonaChatRequest {
    /// Caller's tenant
    pub tenant_id: TenantId,
    /// Caller
    pub user_id: Uuid,
    /// Idea being discussed
    pub idea_id: Uuid,
    /// Persona addressed
    pub role: PersonaRole,
    /// Founder message
    pub message: String,
}

/// Replay chat log entries as conversation messages
#[must_use]
pub fn history_messages(history: &[ChatLogRecord]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|entry| {
            if entry.role == SPEAKER_USER {
                ChatMessage::user(entry.message.clone())
            } else {
                ChatMessage::assistant(entry.message.clone())
            }
        })
        .collect()
}

/// Send `message` to the `role` persona of an idea
///
/// Order: quota pre-check, session, generation, quota post-check, persistence.
/// Nothing is written to the chat log when a quota check fails.
///
/// # Errors
///
/// `NotFound` for an unknown idea, `QuotaExceeded`, `GenerationFailed`, or an
/// external service error from session creation
pub async fn chat_with_persona(
    database: &Database,
    resolver: &SessionResolver,
    gateway: &AiGateway,
    turn: &PersonaChatRequest,
) -> AppResult<PersonaChatReply> {
    let PersonaChatRequest {
        tenant_id,
        user_id,
        idea_id,
        role,
        message,
    } = turn;
    let (tenant_id, user_id, idea_id) = (*tenant_id, *user_id, *idea_id);
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::missing_field("message"));
    }

    let idea = database.get_user_idea(tenant_id, user_id, idea_id).await?;
    let before = quota_status(database, tenant_id, Utc::now()).await?;
    ensure_not_exhausted(tenant_id, &before)?;

    let session = resolver
        .resolve(&SessionKey::new(tenant_id, user_id, idea_id, role.clone()))
        .await?;

    let history = database
        .get_recent_persona_messages(tenant_id, idea_id, role.as_str(), CHAT_HISTORY_WINDOW)
        .await?;
    let mut messages = history_messages(&history);
    messages.push(ChatMessage::user(message));

    let instructions = resolver.instructions_for(role, &idea).await?;
    let request = GenerationRequest::new(tenant_id, user_id, role.clone(), UsageSource::Chat, message)
        .with_project(idea_id)
        .with_system(instructions)
        .with_messages(messages);
    let generation = gateway.generate(&request).await?;

    ensure_within_cap(tenant_id, &before, generation.tokens_used)?;

    database
        .add_chat_message(tenant_id, user_id, idea_id, SPEAKER_USER, role.as_str(), message)
        .await?;
    database
        .add_chat_message(
            tenant_id,
            user_id,
            idea_id,
            SPEAKER_ASSISTANT,
            role.as_str(),
            &generation.content,
        )
        .await?;

    info!(
        idea.id = %idea_id,
        persona.role = %role,
        tokens = generation.tokens_used,
        "Persona chat turn stored"
    );

    Ok(PersonaChatReply {
        remaining_tokens: remaining_after(&before, generation.tokens_used),
        reply: generation.content,
        role: role.to_string(),
        tokens_used: generation.tokens_used,
        backend: generation.backend,
        assistant_id: session.assistant_id,
        thread_id: session.thread_id,
    })
}
