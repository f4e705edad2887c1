// ABOUTME: Persistence for assistant sessions keyed by tenant, user, project and role
// ABOUTME: A unique index plus insert-or-fetch makes concurrent creators converge on one row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{AssistantSession, PersonaRole, SessionKey, TenantId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, timestamp_now, Database};

/// Result of an insert-or-fetch on the session table
#[derive(Debug, Clone)]
pub enum SessionInsertOutcome {
    /// This caller's row was stored
    Inserted(AssistantSession),
    /// Another caller stored a row for the same key first
    Existing(AssistantSession),
}

const SESSION_COLUMNS: &str =
    "id, tenant_id, user_id, project_id, role, assistant_id, thread_id, created_at, updated_at";

fn session_from_row(row: &SqliteRow) -> AppResult<AssistantSession> {
    let tenant: String = row.try_get("tenant_id")?;
    let role: String = row.try_get("role")?;
    Ok(AssistantSession {
        id: parse_uuid(row.try_get("id")?)?,
        tenant_id: TenantId::from_uuid(parse_uuid(&tenant)?),
        user_id: parse_uuid(row.try_get("user_id")?)?,
        project_id: parse_uuid(row.try_get("project_id")?)?,
        role: PersonaRole::parse(&role)?,
        assistant_id: row.try_get("assistant_id")?,
        thread_id: row.try_get("thread_id")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
        updated_at: parse_timestamp(row.try_get("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_sessions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS assistant_sessions (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                project_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                assistant_id TEXT NOT NULL,
                thread_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_assistant_sessions_key
            ON assistant_sessions(tenant_id, user_id, project_id, role)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up the session for a key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_session(&self, key: &SessionKey) -> AppResult<Option<AssistantSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM assistant_sessions \
             WHERE tenant_id = $1 AND user_id = $2 AND project_id = $3 AND role = $4"
        ))
        .bind(key.tenant_id.to_string())
        .bind(key.user_id.to_string())
        .bind(key.project_id.to_string())
        .bind(key.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get assistant session: {e}")))?;

        row.as_ref().map(session_from_row).transpose()
    }

    /// Insert a session unless one already exists for the key, then return the stored row
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or the follow-up read fails
    pub async fn insert_session_or_fetch(
        &self,
        key: &SessionKey,
        assistant_id: &str,
        thread_id: &str,
    ) -> AppResult<SessionInsertOutcome> {
        let id = Uuid::new_v4();
        let now = timestamp_now();

        let result = sqlx::query(
            r"
            INSERT INTO assistant_sessions
                (id, tenant_id, user_id, project_id, role, assistant_id, thread_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT(tenant_id, user_id, project_id, role) DO NOTHING
            ",
        )
        .bind(id.to_string())
        .bind(key.tenant_id.to_string())
        .bind(key.user_id.to_string())
        .bind(key.project_id.to_string())
        .bind(key.role.as_str())
        .bind(assistant_id)
        .bind(thread_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert assistant session: {e}")))?;

        let stored = self
            .get_session(key)
            .await?
            .ok_or_else(|| AppError::internal("Assistant session missing after insert"))?;

        if result.rows_affected() == 1 && stored.id == id {
            Ok(SessionInsertOutcome::Inserted(stored))
        } else {
            Ok(SessionInsertOutcome::Existing(stored))
        }
    }

    /// Replace the conversation handle of an existing session
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session exists for the key
    pub async fn update_session_thread(
        &self,
        key: &SessionKey,
        thread_id: &str,
    ) -> AppResult<AssistantSession> {
        let result = sqlx::query(
            r"
            UPDATE assistant_sessions SET thread_id = $1, updated_at = $2
            WHERE tenant_id = $3 AND user_id = $4 AND project_id = $5 AND role = $6
            ",
        )
        .bind(thread_id)
        .bind(timestamp_now())
        .bind(key.tenant_id.to_string())
        .bind(key.user_id.to_string())
        .bind(key.project_id.to_string())
        .bind(key.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update session thread: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Assistant session for role '{}'",
                key.role
            )));
        }
        self.get_session(key)
            .await?
            .ok_or_else(|| AppError::internal("Assistant session missing after update"))
    }

    /// List every persona session a user has for one project
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_project_sessions(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<Vec<AssistantSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM assistant_sessions \
             WHERE tenant_id = $1 AND user_id = $2 AND project_id = $3 ORDER BY created_at ASC"
        ))
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list assistant sessions: {e}")))?;

        rows.iter().map(session_from_row).collect()
    }
}
