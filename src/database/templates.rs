// ABOUTME: Per-role prompt template storage used to build persona instructions
// ABOUTME: At most one template per role; inactive templates are ignored by lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{PersonaRole, PromptTemplate};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, timestamp_now, Database};

impl Database {
    pub(super) async fn migrate_templates(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS prompt_templates (
                id TEXT PRIMARY KEY,
                role TEXT NOT NULL UNIQUE,
                template_text TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the active template for a role
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_active_template(&self, role: &PersonaRole) -> AppResult<Option<PromptTemplate>> {
        let row = sqlx::query(
            r"
            SELECT id, role, template_text, is_active, updated_at
            FROM prompt_templates
            WHERE role = $1 AND is_active = 1
            ",
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get prompt template: {e}")))?;

        row.map(|r| {
            let stored_role: String = r.try_get("role")?;
            Ok(PromptTemplate {
                id: parse_uuid(r.try_get("id")?)?,
                role: PersonaRole::parse(&stored_role)?,
                template_text: r.try_get("template_text")?,
                is_active: r.try_get("is_active")?,
                updated_at: parse_timestamp(r.try_get("updated_at")?)?,
            })
        })
        .transpose()
    }

    /// Create or replace the template for a role
    ///
    /// Templates are authored out-of-band; this is used for seeding.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_template(
        &self,
        role: &PersonaRole,
        template_text: &str,
        is_active: bool,
    ) -> AppResult<()> {
        let now = timestamp_now();
        sqlx::query(
            r"
            INSERT INTO prompt_templates (id, role, template_text, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT(role) DO UPDATE SET
                template_text = excluded.template_text,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(role.as_str())
        .bind(template_text)
        .bind(is_active)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save prompt template: {e}")))?;

        Ok(())
    }
}
