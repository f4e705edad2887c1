// ABOUTME: Append-only token usage ledger plus plan and subscription lookups
// ABOUTME: Monthly usage is the tenant-wide sum since 00:00 UTC on the first of the month
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{TenantId, UsageRecord, UsageSource};
use sqlx::Row;
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, timestamp_now, to_u32, Database};

/// Ledger entry to append
#[derive(Debug, Clone)]
pub struct NewUsageRecord<'a> {
    /// Tenant billed for the tokens
    pub tenant_id: TenantId,
    /// User who triggered the generation
    pub user_id: Uuid,
    /// Project the generation concerned
    pub project_id: Option<Uuid>,
    /// Chat or background generation
    pub source: UsageSource,
    /// Backend that served the call
    pub backend: &'a str,
    /// Model that served the call
    pub model: &'a str,
    /// Tokens consumed
    pub tokens_used: u32,
}

/// First instant of the month containing `now`
pub(crate) fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

impl Database {
    pub(super) async fn migrate_usage(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS usage_records (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                project_id TEXT,
                source TEXT NOT NULL CHECK (source IN ('chat', 'generation')),
                backend TEXT NOT NULL,
                model TEXT NOT NULL,
                tokens_used INTEGER NOT NULL CHECK (tokens_used >= 0),
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_usage_records_tenant_time ON usage_records(tenant_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                max_tokens INTEGER NOT NULL CHECK (max_tokens >= 0)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS subscriptions (
                tenant_id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL REFERENCES plans(id),
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one usage record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn record_usage(&self, entry: &NewUsageRecord<'_>) -> AppResult<UsageRecord> {
        let id = Uuid::new_v4();
        let now = timestamp_now();

        sqlx::query(
            r"
            INSERT INTO usage_records (id, tenant_id, user_id, project_id, source, backend, model, tokens_used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(id.to_string())
        .bind(entry.tenant_id.to_string())
        .bind(entry.user_id.to_string())
        .bind(entry.project_id.map(|p| p.to_string()))
        .bind(entry.source.as_str())
        .bind(entry.backend)
        .bind(entry.model)
        .bind(i64::from(entry.tokens_used))
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record usage: {e}")))?;

        Ok(UsageRecord {
            id,
            tenant_id: entry.tenant_id,
            user_id: entry.user_id,
            project_id: entry.project_id,
            source: entry.source,
            backend: entry.backend.to_owned(),
            model: entry.model.to_owned(),
            tokens_used: entry.tokens_used,
            created_at: parse_timestamp(&now)?,
        })
    }

    /// Tokens the tenant has consumed since the start of the month containing `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn monthly_usage(&self, tenant_id: TenantId, now: DateTime<Utc>) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(tokens_used), 0)
            FROM usage_records
            WHERE tenant_id = $1 AND created_at >= $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(format_timestamp(month_start(now)))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to sum monthly usage: {e}")))?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// List a tenant's usage records, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_usage(&self, tenant_id: TenantId, limit: i64) -> AppResult<Vec<UsageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, tenant_id, user_id, project_id, source, backend, model, tokens_used, created_at
            FROM usage_records
            WHERE tenant_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list usage: {e}")))?;

        rows.iter()
            .map(|r| {
                let tenant: String = r.try_get("tenant_id")?;
                let project: Option<String> = r.try_get("project_id")?;
                let source: String = r.try_get("source")?;
                Ok(UsageRecord {
                    id: parse_uuid(r.try_get("id")?)?,
                    tenant_id: TenantId::from_uuid(parse_uuid(&tenant)?),
                    user_id: parse_uuid(r.try_get("user_id")?)?,
                    project_id: project.as_deref().map(parse_uuid).transpose()?,
                    source: source.parse()?,
                    backend: r.try_get("backend")?,
                    model: r.try_get("model")?,
                    tokens_used: to_u32(r.try_get("tokens_used")?),
                    created_at: parse_timestamp(r.try_get("created_at")?)?,
                })
            })
            .collect()
    }

    /// Token cap of the tenant's plan, `None` when it has no subscription
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn tenant_token_cap(&self, tenant_id: TenantId) -> AppResult<Option<u64>> {
        let cap: Option<i64> = sqlx::query_scalar(
            r"
            SELECT p.max_tokens
            FROM subscriptions s
            JOIN plans p ON p.id = s.plan_id
            WHERE s.tenant_id = $1
            ",
        )
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get tenant plan: {e}")))?;

        Ok(cap.map(|c| u64::try_from(c).unwrap_or(0)))
    }

    /// Create or update a plan by name, returning its ID
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_plan(&self, name: &str, max_tokens: u64) -> AppResult<Uuid> {
        let max_tokens = i64::try_from(max_tokens)
            .map_err(|_| AppError::invalid_input("max_tokens is too large"))?;
        sqlx::query(
            r"
            INSERT INTO plans (id, name, max_tokens) VALUES ($1, $2, $3)
            ON CONFLICT(name) DO UPDATE SET max_tokens = excluded.max_tokens
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(max_tokens)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save plan: {e}")))?;

        let id: String = sqlx::query_scalar("SELECT id FROM plans WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read plan: {e}")))?;
        parse_uuid(&id)
    }

    /// Subscribe a tenant to a plan, replacing any previous subscription
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn assign_plan(&self, tenant_id: TenantId, plan_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO subscriptions (tenant_id, plan_id, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT(tenant_id) DO UPDATE SET plan_id = excluded.plan_id, updated_at = excluded.updated_at
            ",
        )
        .bind(tenant_id.to_string())
        .bind(plan_id.to_string())
        .bind(timestamp_now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to assign plan: {e}")))?;

        Ok(())
    }
}
