// ABOUTME: Maps (tenant, user, project, role) to an external persona and thread
// ABOUTME: Creates both on a miss and converges concurrent creators on one stored row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::instructions::resolve_instructions;
use super::{AssistantBackend, AssistantSpec};
use crate::database::{Database, SessionInsertOutcome};
use crate::logging::AppLogger;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{AssistantSession, Idea, PersonaRole, SessionKey, TenantId};

/// Session resolver
///
/// A hit returns the stored handles without touching the external service.
/// A miss loads the project, renders the role instructions, creates one
/// persona and one thread, then stores the mapping.
#[derive(Clone)]
pub struct SessionResolver {
    database: Arc<Database>,
    backend: Arc<dyn AssistantBackend>,
    assistant_model: String,
}

impl SessionResolver {
    /// Create a resolver
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        backend: Arc<dyn AssistantBackend>,
        assistant_model: impl Into<String>,
    ) -> Self {
        Self {
            database,
            backend,
            assistant_model: assistant_model.into(),
        }
    }

    /// Persona handle for `key`, creating the persona on first use
    ///
    /// # Errors
    ///
    /// `NotFound` when the project does not exist, an external service error
    /// when persona or thread creation fails
    pub async fn ensure_assistant(&self, key: &SessionKey) -> AppResult<String> {
        Ok(self.resolve(key).await?.assistant_id)
    }

    /// Full session for `key`, creating it on first use
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_assistant`]
    #[instrument(skip(self), fields(tenant = %key.tenant_id, project = %key.project_id, role = %key.role))]
    pub async fn resolve(&self, key: &SessionKey) -> AppResult<AssistantSession> {
        if let Some(existing) = self.database.get_session(key).await? {
            debug!(assistant_id = %existing.assistant_id, "Reusing assistant session");
            return Ok(existing);
        }

        let idea = self
            .database
            .get_idea(key.tenant_id, key.project_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Project {}", key.project_id)))?;

        let spec = AssistantSpec {
            name: format!("{} {}", idea.title, key.role.display_upper()),
            instructions: self.instructions_for(&key.role, &idea).await?,
            model: self.assistant_model.clone(),
        };

        let assistant_id = self.backend.create_assistant(&spec).await?;
        let thread_id = match self.backend.create_thread().await {
            Ok(thread_id) => thread_id,
            Err(e) => {
                self.discard_assistant(&assistant_id).await;
                return Err(e);
            }
        };

        match self
            .database
            .insert_session_or_fetch(key, &assistant_id, &thread_id)
            .await?
        {
            SessionInsertOutcome::Inserted(session) => {
                AppLogger::log_session_created(
                    &key.tenant_id.to_string(),
                    &key.project_id.to_string(),
                    key.role.as_str(),
                    &session.assistant_id,
                );
                Ok(session)
            }
            SessionInsertOutcome::Existing(session) => {
                warn!(
                    winner = %session.assistant_id,
                    orphan = %assistant_id,
                    "Lost assistant session creation race, discarding orphaned persona"
                );
                self.discard_assistant(&assistant_id).await;
                self.discard_thread(&thread_id).await;
                Ok(session)
            }
        }
    }

    /// Replace the session's thread with a fresh, empty one
    ///
    /// # Errors
    ///
    /// `NotFound` when no session exists for `key`
    pub async fn start_new_thread(&self, key: &SessionKey) -> AppResult<AssistantSession> {
        let existing = self
            .database
            .get_session(key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Assistant session for role '{}'", key.role)))?;

        let thread_id = self.backend.create_thread().await?;
        let updated = match self.database.update_session_thread(key, &thread_id).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(thread = %thread_id, error = %e, "Session vanished before thread swap");
                self.discard_thread(&thread_id).await;
                return Err(e);
            }
        };
        info!(
            role = %key.role,
            old_thread = %existing.thread_id,
            new_thread = %updated.thread_id,
            "Started new assistant thread"
        );
        Ok(updated)
    }

    /// Every persona session a user has on one project
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails
    pub async fn list_team(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<Vec<AssistantSession>> {
        self.database
            .list_project_sessions(tenant_id, user_id, project_id)
            .await
    }

    /// Rendered instructions for `role` on `idea`
    ///
    /// # Errors
    ///
    /// Returns an error only if the template lookup itself fails
    pub async fn instructions_for(&self, role: &PersonaRole, idea: &Idea) -> AppResult<String> {
        let template = self.database.get_active_template(role).await?;
        Ok(resolve_instructions(
            template.as_ref().map(|t| t.template_text.as_str()),
            role,
            idea,
        ))
    }

    async fn discard_assistant(&self, assistant_id: &str) {
        if let Err(e) = self.backend.delete_assistant(assistant_id).await {
            warn!(assistant_id, error = %e, "Failed to delete orphaned assistant");
        }
    }

    async fn discard_thread(&self, thread_id: &str) {
        if let Err(e) = self.backend.delete_thread(thread_id).await {
            warn!(thread_id, error = %e, "Failed to delete orphaned thread");
        }
    }
}
