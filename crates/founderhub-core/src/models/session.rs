// ABOUTME: Assistant session mapping and prompt template models
// ABOUTME: A session binds (tenant, user, project, role) to an external persona and thread
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PersonaRole, TenantId};

/// Four-part key identifying one persona conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// User talking to the persona
    pub user_id: Uuid,
    /// Project (idea) the persona advises on
    pub project_id: Uuid,
    /// Persona role
    pub role: PersonaRole,
}

impl SessionKey {
    /// Build a session key
    #[must_use]
    pub fn new(tenant_id: TenantId, user_id: Uuid, project_id: Uuid, role: PersonaRole) -> Self {
        Self {
            tenant_id,
            user_id,
            project_id,
            role,
        }
    }
}

/// Persisted mapping from a [`SessionKey`] to external assistant handles
///
/// At most one row exists per key. Only `thread_id` changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSession {
    /// Row identifier
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// User the session belongs to
    pub user_id: Uuid,
    /// Project (idea) the session belongs to
    pub project_id: Uuid,
    /// Persona role
    pub role: PersonaRole,
    /// Opaque handle of the external persona
    pub assistant_id: String,
    /// Opaque handle of the external conversation
    pub thread_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last time the thread handle changed
    pub updated_at: DateTime<Utc>,
}

/// Per-role instruction template with `{{ idea_name }}` / `{{ idea_summary }}` placeholders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Row identifier
    pub id: Uuid,
    /// Role the template applies to
    pub role: PersonaRole,
    /// Raw template text
    pub template_text: String,
    /// Inactive templates are ignored by lookups
    pub is_active: bool,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}
