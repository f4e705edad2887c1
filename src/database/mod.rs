// ABOUTME: SQLite database manager with idempotent schema migrations
// ABOUTME: Owns the connection pool; domain queries live in the sibling modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Database Management
//!
//! [`Database`] wraps a sqlx SQLite pool. Each submodule adds an `impl Database`
//! block for one domain (ideas, sessions, usage, ...) together with its
//! `CREATE TABLE IF NOT EXISTS` migration, so the schema can be applied on
//! every start-up.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings in UTC so that
//! lexicographic comparison matches chronological order.

mod chat;
mod crm;
mod decisions;
mod ideas;
mod jobs;
mod sessions;
mod templates;
mod usage;

pub use chat::ChatLogRecord;
pub use crm::{
    ContactNoteRecord, ContactRecord, LeadNoteRecord, LeadRecord, LeadTaskRecord, NewContact,
    NewContactNote, NewLead, NewLeadTask,
};
pub use decisions::{DecisionLogRecord, NewDecisionLog};
pub use ideas::{IdeaUpdate, NewIdea};
pub use jobs::{JobRecord, JobStatus};
pub use sessions::SessionInsertOutcome;
pub use usage::NewUsageRecord;
pub(crate) use usage::month_start;

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use founderhub_core::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;
use uuid::Uuid;

/// Database manager for all persisted FounderHub state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the database and apply migrations
    ///
    /// In-memory URLs get a single long-lived connection so every query sees
    /// the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await
        }
        .context("Failed to connect to database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_ideas().await?;
        self.migrate_sessions().await?;
        self.migrate_templates().await?;
        self.migrate_usage().await?;
        self.migrate_chat().await?;
        self.migrate_crm().await?;
        self.migrate_jobs().await?;
        self.migrate_decisions().await?;
        info!("Database migrations applied");
        Ok(())
    }
}

// ============================================================================
// Column helpers
// ============================================================================

/// Current time as a stored timestamp
pub(crate) fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Format a timestamp for storage
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp
pub(crate) fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid stored timestamp '{raw}': {e}")))
}

/// Parse a stored UUID
pub(crate) fn parse_uuid(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::database(format!("Invalid stored UUID '{raw}': {e}")))
}

/// Convert a stored non-negative integer
pub(crate) fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
