// ABOUTME: Idea analysis and summarization through the critic and summarizer personas
// ABOUTME: Applies the same quota ordering as chat and stores results only when within quota
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::fmt::Write as _;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::chat::{SPEAKER_ASSISTANT, SPEAKER_USER};
use super::quota::{ensure_not_exhausted, ensure_within_cap, quota_status, remaining_after};
use crate::assistants::SessionResolver;
use crate::database::{ChatLogRecord, Database};
use crate::gateway::{AiGateway, Generation, GenerationRequest};
use founderhub_core::constants::{roles, MARKER_DECORATION, RECOMMENDED_TEAM_MARKER};
use founderhub_core::errors::AppResult;
use founderhub_core::models::{Idea, IdeaSummary, PersonaRole, SessionKey, TenantId, UsageSource};

/// Outcome of an idea analysis
#[derive(Debug, Clone, Serialize)]
pub struct IdeaAnalysis {
    /// Analyzed idea
    pub idea_id: Uuid,
    /// Critique text
    pub vetting_response: String,
    /// Tokens billed
    pub tokens_used: u32,
    /// Tokens left this month, absent when uncapped
    pub remaining_tokens: Option<u64>,
    /// Backend that served the critique
    pub backend: String,
}

/// Outcome of an idea summarization
#[derive(Debug, Clone, Serialize)]
pub struct IdeaSummaryResult {
    /// Stored summary
    #[serde(flatten)]
    pub summary: IdeaSummary,
    /// Tokens billed
    pub tokens_used: u32,
    /// Tokens left this month, absent when uncapped
    pub remaining_tokens: Option<u64>,
}

/// Prompt describing an idea to the critic
#[must_use]
pub fn analysis_prompt(idea: &Idea) -> String {
    format!(
        "Title: {}\nProblem: {}\nAudience: {}\nSolution: {}\nNotes: {}\n",
        idea.title,
        idea.problem,
        idea.audience,
        idea.solution,
        idea.notes.as_deref().unwrap_or("N/A"),
    )
}

/// Prompt asking the summarizer for a structured summary of an idea and its transcript
#[must_use]
pub fn summary_prompt(idea: &Idea, transcript: &[ChatLogRecord]) -> String {
    let mut prompt = format!(
        "You are a strategic product consultant.\n\
         Analyze the conversation below and return a clear, structured startup summary, \
         ending with a \"{RECOMMENDED_TEAM_MARKER}\" section.\n\n\
         Startup Info:\nTitle: {}\nProblem: {}\nAudience: {}\nSolution: {}\n\nTranscript:\n",
        idea.title, idea.problem, idea.audience, idea.solution,
    );
    for entry in transcript {
        let speaker = if entry.role == SPEAKER_USER {
            "User"
        } else {
            "Assistant"
        };
        let _ = writeln!(prompt, "{speaker} ({}): {}", entry.persona, entry.message);
    }
    prompt
}

/// Split a summarizer reply into `(summary, recommended_team)`
///
/// A reply without the marker is all summary.
#[must_use]
pub fn split_summary(reply: &str) -> (String, String) {
    let is_decoration = |c: char| c.is_whitespace() || MARKER_DECORATION.contains(&c);
    match reply.split_once(RECOMMENDED_TEAM_MARKER) {
        Some((summary, team)) => (
            summary.trim_end_matches(is_decoration).trim_start().to_owned(),
            team.trim_start_matches(is_decoration).trim_end().to_owned(),
        ),
        None => (reply.trim().to_owned(), String::new()),
    }
}

async fn generate_within_quota(
    database: &Database,
    resolver: &SessionResolver,
    gateway: &AiGateway,
    idea: &Idea,
    role: &PersonaRole,
    prompt: String,
) -> AppResult<(Generation, Option<u64>)> {
    let tenant_id = idea.tenant_id;
    let before = quota_status(database, tenant_id, Utc::now()).await?;
    ensure_not_exhausted(tenant_id, &before)?;

    resolver
        .resolve(&SessionKey::new(tenant_id, idea.user_id, idea.id, role.clone()))
        .await?;

    let instructions = resolver.instructions_for(role, idea).await?;
    let request = GenerationRequest::new(
        tenant_id,
        idea.user_id,
        role.clone(),
        UsageSource::Generation,
        prompt,
    )
    .with_project(idea.id)
    .with_system(instructions);
    let generation = gateway.generate(&request).await?;

    ensure_within_cap(tenant_id, &before, generation.tokens_used)?;
    let remaining = remaining_after(&before, generation.tokens_used);
    Ok((generation, remaining))
}

/// Critique an idea with the startup critic persona
///
/// # Errors
///
/// `NotFound`, `QuotaExceeded`, `GenerationFailed`, or a database error
pub async fn analyze_idea(
    database: &Database,
    resolver: &SessionResolver,
    gateway: &AiGateway,
    tenant_id: TenantId,
    user_id: Uuid,
    idea_id: Uuid,
) -> AppResult<IdeaAnalysis> {
    let idea = database.get_user_idea(tenant_id, user_id, idea_id).await?;
    let role = PersonaRole::parse(roles::STARTUP_CRITIC)?;

    let (generation, remaining_tokens) =
        generate_within_quota(database, resolver, gateway, &idea, &role, analysis_prompt(&idea))
            .await?;

    database
        .record_idea_analysis(idea_id, &generation.content, generation.tokens_used)
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

    Ok(IdeaAnalysis {
        idea_id,
        vetting_response: generation.content,
        tokens_used: generation.tokens_used,
        remaining_tokens,
        backend: generation.backend,
    })
}

/// Summarize an idea and its full conversation with the summarizer persona
///
/// # Errors
///
/// `NotFound`, `QuotaExceeded`, `GenerationFailed`, or a database error
pub async fn summarize_idea(
    database: &Database,
    resolver: &SessionResolver,
    gateway: &AiGateway,
    tenant_id: TenantId,
    user_id: Uuid,
    idea_id: Uuid,
) -> AppResult<IdeaSummaryResult> {
    let idea = database.get_user_idea(tenant_id, user_id, idea_id).await?;
    let role = PersonaRole::parse(roles::SUMMARIZER)?;
    let transcript = database.get_chat_log(tenant_id, idea_id).await?;

    let (generation, remaining_tokens) = generate_within_quota(
        database,
        resolver,
        gateway,
        &idea,
        &role,
        summary_prompt(&idea, &transcript),
    )
    .await?;

    let (summary, team) = split_summary(&generation.content);
    let stored = database.upsert_idea_summary(idea_id, &summary, &team).await?;
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

    Ok(IdeaSummaryResult {
        summary: stored,
        tokens_used: generation.tokens_used,
        remaining_tokens,
    })
}
