// ABOUTME: Database operations for the per-idea chat log between founders and personas
// ABOUTME: Stores user and assistant messages tagged with the persona role they belong to
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{timestamp_now, Database};

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of one chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLogRecord {
    /// Unique message ID
    pub id: String,
    /// Idea the conversation is about
    pub idea_id: String,
    /// Sender: `user` or `assistant`
    pub role: String,
    /// Persona role tag the message was exchanged with
    pub persona: String,
    /// Message content
    pub message: String,
    /// When the message was created (ISO 8601)
    pub created_at: String,
}

fn chat_record_from_row(r: &SqliteRow) -> AppResult<ChatLogRecord> {
    Ok(ChatLogRecord {
        id: r.try_get("id")?,
        idea_id: r.try_get("idea_id")?,
        role: r.try_get("role")?,
        persona: r.try_get("persona")?,
        message: r.try_get("message")?,
        created_at: r.try_get("created_at")?,
    })
}

impl Database {
    pub(super) async fn migrate_chat(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_log (
                id TEXT PRIMARY KEY,
                idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                tenant_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                persona TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL,
                seq INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chat_log_idea ON chat_log(idea_id, seq)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Append a message to an idea's chat log
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn add_chat_message(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        idea_id: Uuid,
        role: &str,
        persona: &str,
        message: &str,
    ) -> AppResult<ChatLogRecord> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r"
            INSERT INTO chat_log (id, idea_id, tenant_id, user_id, role, persona, message, created_at, seq)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    (SELECT COALESCE(MAX(seq), 0) + 1 FROM chat_log WHERE idea_id = $2))
            ",
        )
        .bind(&id)
        .bind(idea_id.to_string())
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .bind(role)
        .bind(persona)
        .bind(message)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add chat message: {e}")))?;

        Ok(ChatLogRecord {
            id,
            idea_id: idea_id.to_string(),
            role: role.to_owned(),
            persona: persona.to_owned(),
            message: message.to_owned(),
            created_at: now,
        })
    }

    /// Full chat log of an idea, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_chat_log(
        &self,
        tenant_id: TenantId,
        idea_id: Uuid,
    ) -> AppResult<Vec<ChatLogRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, idea_id, role, persona, message, created_at
            FROM chat_log
            WHERE idea_id = $1 AND tenant_id = $2
            ORDER BY seq ASC
            ",
        )
        .bind(idea_id.to_string())
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get chat log: {e}")))?;

        rows.iter().map(chat_record_from_row).collect()
    }

    /// Most recent messages exchanged with one persona, returned oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_recent_persona_messages(
        &self,
        tenant_id: TenantId,
        idea_id: Uuid,
        persona: &str,
        limit: i64,
    ) -> AppResult<Vec<ChatLogRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, idea_id, role, persona, message, created_at FROM (
                SELECT id, idea_id, role, persona, message, created_at, seq
                FROM chat_log
                WHERE idea_id = $1 AND tenant_id = $2 AND persona = $3
                ORDER BY seq DESC
                LIMIT $4
            ) ORDER BY seq ASC
            ",
        )
        .bind(idea_id.to_string())
        .bind(tenant_id.to_string())
        .bind(persona)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent messages: {e}")))?;

        rows.iter().map(chat_record_from_row).collect()
    }

    /// Number of messages stored for an idea
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_chat_messages(&self, idea_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM chat_log WHERE idea_id = $1")
            .bind(idea_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count chat messages: {e}")))
    }
}
