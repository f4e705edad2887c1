// ABOUTME: Persona route handlers: team listing, chat turns and fresh threads
// ABOUTME: Sessions are created lazily by the resolver on the first chat with a role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{authenticate, parse_id, ApiJson};
use crate::resources::ServerResources;
use crate::services::chat::{chat_with_persona, PersonaChatRequest};
use founderhub_core::errors::AppError;
use founderhub_core::models::{AssistantSession, PersonaRole, SessionKey};

/// Request to chat with a persona
#[derive(Debug, Deserialize)]
pub struct PersonaChatBody {
    /// Founder message
    pub message: String,
}

/// One persona of an idea's team
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamMember {
    /// Role tag
    pub role: String,
    /// External persona handle
    pub assistant_id: String,
    /// External conversation handle
    pub thread_id: String,
    /// When the persona was created (ISO 8601)
    pub created_at: String,
}

impl From<AssistantSession> for TeamMember {
    fn from(session: AssistantSession) -> Self {
        Self {
            role: session.role.to_string(),
            assistant_id: session.assistant_id,
            thread_id: session.thread_id,
            created_at: session.created_at.to_rfc3339(),
        }
    }
}

/// Response for listing an idea's personas
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamResponse {
    /// Idea the team advises
    pub idea_id: String,
    /// Personas in creation order
    pub team: Vec<TeamMember>,
}

/// Persona routes
pub struct AssistantRoutes;

impl AssistantRoutes {
    /// Create all persona routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/ideas/:idea_id/team", get(Self::list_team))
            .route(
                "/api/ideas/:idea_id/assistants/:role/chat",
                post(Self::chat),
            )
            .route(
                "/api/ideas/:idea_id/assistants/:role/threads",
                post(Self::new_thread),
            )
            .with_state(resources)
    }

    async fn list_team(
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

        let sessions = resources
            .resolver
            .list_team(auth.tenant_id, auth.user_id, idea_id)
            .await?;
        if sessions.is_empty() {
            return Err(AppError::not_found(format!("Team for idea {idea_id}")));
        }

        let response = TeamResponse {
            idea_id: idea_id.to_string(),
            team: sessions.into_iter().map(TeamMember::from).collect(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((idea_id, role)): Path<(String, String)>,
        ApiJson(body): ApiJson<PersonaChatBody>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let request = PersonaChatRequest {
            tenant_id: auth.tenant_id,
            user_id: auth.user_id,
            idea_id: parse_id(&idea_id, "idea")?,
            role: PersonaRole::parse(&role)?,
            message: body.message,
        };

        let reply = chat_with_persona(
            &resources.database,
            &resources.resolver,
            &resources.gateway,
            &request,
        )
        .await?;
        Ok((StatusCode::OK, Json(reply)).into_response())
    }

    async fn new_thread(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((idea_id, role)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let idea_id = parse_id(&idea_id, "idea")?;
        resources
            .database
            .get_user_idea(auth.tenant_id, auth.user_id, idea_id)
            .await?;

        let key = SessionKey::new(
            auth.tenant_id,
            auth.user_id,
            idea_id,
            PersonaRole::parse(&role)?,
        );
        let session = resources.resolver.start_new_thread(&key).await?;
        Ok((StatusCode::CREATED, Json(TeamMember::from(session))).into_response())
    }
}
