// ABOUTME: Database operations for startup ideas and their generated summaries
// ABOUTME: Every query is scoped by tenant, and by user where the caller owns the idea
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{Idea, IdeaSummary, TenantId};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, timestamp_now, to_u32, Database};

/// Fields supplied when creating an idea
#[derive(Debug, Clone, Deserialize)]
pub struct NewIdea {
    /// Short name
    pub title: String,
    /// Problem statement
    pub problem: String,
    /// Target audience
    pub audience: String,
    /// Proposed solution
    pub solution: String,
    /// Optional founder notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewIdea {
    /// Reject blank required fields
    ///
    /// # Errors
    ///
    /// Returns a missing-field error naming the first blank field
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("title", &self.title),
            ("problem", &self.problem),
            ("audience", &self.audience),
            ("solution", &self.solution),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::missing_field(field));
            }
        }
        Ok(())
    }
}

/// Partial update of an idea; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaUpdate {
    /// New title
    pub title: Option<String>,
    /// New problem statement
    pub problem: Option<String>,
    /// New audience
    pub audience: Option<String>,
    /// New solution
    pub solution: Option<String>,
    /// New notes
    pub notes: Option<String>,
}

impl IdeaUpdate {
    /// Reject fields explicitly set to blank
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error naming the blank field
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("title", &self.title),
            ("problem", &self.problem),
            ("audience", &self.audience),
            ("solution", &self.solution),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::invalid_input(format!("Field '{field}' must not be blank")));
            }
        }
        Ok(())
    }
}

const IDEA_COLUMNS: &str = "id, tenant_id, user_id, title, problem, audience, solution, notes, \
     vetting_status, vetting_response, tokens_used, created_at, updated_at";

fn idea_from_row(row: &SqliteRow) -> AppResult<Idea> {
    let tenant: String = row.try_get("tenant_id")?;
    Ok(Idea {
        id: parse_uuid(row.try_get("id")?)?,
        tenant_id: TenantId::from_uuid(parse_uuid(&tenant)?),
        user_id: parse_uuid(row.try_get("user_id")?)?,
        title: row.try_get("title")?,
        problem: row.try_get("problem")?,
        audience: row.try_get("audience")?,
        solution: row.try_get("solution")?,
        notes: row.try_get("notes")?,
        vetting_status: row.try_get("vetting_status")?,
        vetting_response: row.try_get("vetting_response")?,
        tokens_used: to_u32(row.try_get("tokens_used")?),
        created_at: parse_timestamp(row.try_get("created_at")?)?,
        updated_at: parse_timestamp(row.try_get("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_ideas(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ideas (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                problem TEXT NOT NULL,
                audience TEXT NOT NULL,
                solution TEXT NOT NULL,
                notes TEXT,
                vetting_status TEXT NOT NULL DEFAULT 'pending',
                vetting_response TEXT,
                tokens_used INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ideas_owner ON ideas(tenant_id, user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS idea_summaries (
                idea_id TEXT PRIMARY KEY REFERENCES ideas(id) ON DELETE CASCADE,
                summary TEXT NOT NULL,
                recommended_team TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create an idea owned by the given user
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the insert fails
    pub async fn create_idea(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        idea: &NewIdea,
    ) -> AppResult<Idea> {
        idea.validate()?;
        let id = Uuid::new_v4();
        let now = timestamp_now();

        sqlx::query(
            r"
            INSERT INTO ideas (id, tenant_id, user_id, title, problem, audience, solution, notes,
                               vetting_status, tokens_used, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', 0, $9, $9)
            ",
        )
        .bind(id.to_string())
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .bind(idea.title.trim())
        .bind(idea.problem.trim())
        .bind(idea.audience.trim())
        .bind(idea.solution.trim())
        .bind(idea.notes.as_deref())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create idea: {e}")))?;

        self.get_idea(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::internal("Idea vanished after insert"))
    }

    /// Get an idea by ID within a tenant
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_idea(&self, tenant_id: TenantId, idea_id: Uuid) -> AppResult<Option<Idea>> {
        let row = sqlx::query(&format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(idea_id.to_string())
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get idea: {e}")))?;

        row.as_ref().map(idea_from_row).transpose()
    }

    /// Get an idea owned by a specific user, failing with `NotFound` otherwise
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the idea does not exist or belongs to someone else
    pub async fn get_user_idea(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        idea_id: Uuid,
    ) -> AppResult<Idea> {
        match self.get_idea(tenant_id, idea_id).await? {
            Some(idea) if idea.user_id == user_id => Ok(idea),
            _ => Err(AppError::not_found(format!("Idea {idea_id}"))),
        }
    }

    /// List a user's ideas, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_ideas(&self, tenant_id: TenantId, user_id: Uuid) -> AppResult<Vec<Idea>> {
        let rows = sqlx::query(&format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE tenant_id = $1 AND user_id = $2 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list ideas: {e}")))?;

        rows.iter().map(idea_from_row).collect()
    }

    /// Apply a partial update to a user's idea
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the idea is not the user's, or a database error
    pub async fn update_idea(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        idea_id: Uuid,
        update: &IdeaUpdate,
    ) -> AppResult<Idea> {
        update.validate()?;
        let result = sqlx::query(
            r"
            UPDATE ideas SET
                title = COALESCE($1, title),
                problem = COALESCE($2, problem),
                audience = COALESCE($3, audience),
                solution = COALESCE($4, solution),
                notes = COALESCE($5, notes),
                updated_at = $6
            WHERE id = $7 AND tenant_id = $8 AND user_id = $9
            ",
        )
        .bind(update.title.as_deref().map(str::trim))
        .bind(update.problem.as_deref().map(str::trim))
        .bind(update.audience.as_deref().map(str::trim))
        .bind(update.solution.as_deref().map(str::trim))
        .bind(update.notes.as_deref())
        .bind(timestamp_now())
        .bind(idea_id.to_string())
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update idea: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Idea {idea_id}")));
        }
        self.get_user_idea(tenant_id, user_id, idea_id).await
    }

    /// Mark a user's idea as committed, the founder's decision to pursue it
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the idea is not the user's, or a database error
    pub async fn commit_idea(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        idea_id: Uuid,
    ) -> AppResult<Idea> {
        let result = sqlx::query(
            r"
            UPDATE ideas SET vetting_status = 'committed', updated_at = $1
            WHERE id = $2 AND tenant_id = $3 AND user_id = $4
            ",
        )
        .bind(timestamp_now())
        .bind(idea_id.to_string())
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to commit idea: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Idea {idea_id}")));
        }
        self.get_user_idea(tenant_id, user_id, idea_id).await
    }

    /// Delete a user's idea together with its chat log and summary
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete_idea(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        idea_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM ideas WHERE id = $1 AND tenant_id = $2 AND user_id = $3")
            .bind(idea_id.to_string())
            .bind(tenant_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete idea: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Store the critique produced by an idea analysis
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn record_idea_analysis(
        &self,
        idea_id: Uuid,
        vetting_response: &str,
        tokens_used: u32,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE ideas
            SET vetting_status = 'analyzed', vetting_response = $1, tokens_used = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(vetting_response)
        .bind(i64::from(tokens_used))
        .bind(timestamp_now())
        .bind(idea_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record idea analysis: {e}")))?;

        Ok(())
    }

    /// Insert or replace the summary of an idea
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_idea_summary(
        &self,
        idea_id: Uuid,
        summary: &str,
        recommended_team: &str,
    ) -> AppResult<IdeaSummary> {
        let now = timestamp_now();
        sqlx::query(
            r"
            INSERT INTO idea_summaries (idea_id, summary, recommended_team, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(idea_id) DO UPDATE SET
                summary = excluded.summary,
                recommended_team = excluded.recommended_team,
                updated_at = excluded.updated_at
            ",
        )
        .bind(idea_id.to_string())
        .bind(summary)
        .bind(recommended_team)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save idea summary: {e}")))?;

        Ok(IdeaSummary {
            idea_id,
            summary: summary.to_owned(),
            recommended_team: recommended_team.to_owned(),
            updated_at: parse_timestamp(&now)?,
        })
    }

    /// Get the stored summary of an idea
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_idea_summary(&self, idea_id: Uuid) -> AppResult<Option<IdeaSummary>> {
        let row = sqlx::query(
            "SELECT idea_id, summary, recommended_team, updated_at FROM idea_summaries WHERE idea_id = $1",
        )
        .bind(idea_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get idea summary: {e}")))?;

        row.map(|r| {
            Ok(IdeaSummary {
                idea_id: parse_uuid(r.try_get("idea_id")?)?,
                summary: r.try_get("summary")?,
                recommended_team: r.try_get("recommended_team")?,
                updated_at: parse_timestamp(r.try_get("updated_at")?)?,
            })
        })
        .transpose()
    }
}
