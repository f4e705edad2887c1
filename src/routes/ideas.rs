// ABOUTME: Idea route handlers for CRUD, chat history, analysis and summaries
// ABOUTME: Every handler is scoped to the authenticated caller's tenant and user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! Idea routes
//!
//! Ideas are the projects personas advise on. Analysis and summaries spend
//! tokens and are therefore subject to the monthly quota.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{authenticate, parse_id, ApiJson};
use crate::database::{ChatLogRecord, IdeaUpdate, NewIdea};
use crate::resources::ServerResources;
use crate::services::ideas::{analyze_idea, summarize_idea};
use founderhub_core::errors::AppError;
use founderhub_core::models::Idea;

/// Response for listing ideas
#[derive(Debug, Serialize, Deserialize)]
pub struct IdeaListResponse {
    /// Ideas, newest first
    pub ideas: Vec<Idea>,
    /// Total count
    pub total: usize,
}

/// Response for an idea's chat history
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatLogResponse {
    /// Idea the history belongs to
    pub idea_id: String,
    /// Messages, oldest first
    pub messages: Vec<ChatLogRecord>,
    /// Total count
    pub total: usize,
}

/// Idea routes
pub struct IdeaRoutes;

impl IdeaRoutes {
    /// Create all idea routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/ideas", post(Self::create_idea).get(Self::list_ideas))
            .route(
                "/api/ideas/:idea_id",
                get(Self::get_idea)
                    .put(Self::update_idea)
                    .delete(Self::delete_idea),
            )
            .route("/api/ideas/:idea_id/commit", put(Self::commit_idea))
            .route("/api/ideas/:idea_id/chat-log", get(Self::get_chat_log))
            .route("/api/ideas/:idea_id/analyze", post(Self::analyze))
            .route("/api/ideas/:idea_id/summarize", post(Self::summarize))
            .with_state(resources)
    }

    async fn create_idea(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<NewIdea>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea = resources
            .database
            .create_idea(auth.tenant_id, auth.user_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(idea)).into_response())
    }

    async fn list_ideas(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let ideas = resources
            .database
            .list_ideas(auth.tenant_id, auth.user_id)
            .await?;
        let total = ideas.len();
        Ok((StatusCode::OK, Json(IdeaListResponse { ideas, total })).into_response())
    }

    async fn get_idea(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        let idea = resources
            .database
            .get_user_idea(auth.tenant_id, auth.user_id, idea_id)
            .await?;
        Ok((StatusCode::OK, Json(idea)).into_response())
    }

    async fn update_idea(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
        ApiJson(request): ApiJson<IdeaUpdate>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        let idea = resources
            .database
            .update_idea(auth.tenant_id, auth.user_id, idea_id, &request)
            .await?;
        Ok((StatusCode::OK, Json(idea)).into_response())
    }

    async fn commit_idea(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        let idea = resources
            .database
            .commit_idea(auth.tenant_id, auth.user_id, idea_id)
            .await?;
        Ok((StatusCode::OK, Json(idea)).into_response())
    }

    async fn delete_idea(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        let deleted = resources
            .database
            .delete_idea(auth.tenant_id, auth.user_id, idea_id)
            .await?;
        if !deleted {
            return Err(AppError::not_found(format!("Idea {idea_id}")));
        }
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    async fn get_chat_log(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        resources
            .database
            .get_user_idea(auth.tenant_id, auth.user_id, idea_id)
            .await?;

        let messages = resources
            .database
            .get_chat_log(auth.tenant_id, idea_id)
            .await?;
        let response = ChatLogResponse {
            idea_id: idea_id.to_string(),
            total: messages.len(),
            messages,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn analyze(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        let analysis = analyze_idea(
            &resources.database,
            &resources.resolver,
            &resources.gateway,
            auth.tenant_id,
            auth.user_id,
            idea_id,
        )
        .await?;
        Ok((StatusCode::OK, Json(analysis)).into_response())
    }

    async fn summarize(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(idea_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        let summary = summarize_idea(
            &resources.database,
            &resources.resolver,
            &resources.gateway,
            auth.tenant_id,
            auth.user_id,
            idea_id,
        )
        .await?;
        Ok((StatusCode::OK, Json(summary)).into_response())
    }
}
