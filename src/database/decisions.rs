// ABOUTME: Decision log storage for KPI anomaly checks run by analytics agents
// ABOUTME: Each row records the statistics behind one normal/anomaly verdict
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::{timestamp_now, Database};

/// Decision log entry to append
#[derive(Debug, Clone)]
pub struct NewDecisionLog<'a> {
    /// Agent that made the decision
    pub agent: &'a str,
    /// KPI that was checked
    pub kpi: &'a str,
    /// Latest observed value
    pub current: f64,
    /// Mean of the history
    pub average: f64,
    /// Population standard deviation of the history
    pub std_dev: f64,
    /// Absolute distance of the current value from the mean
    pub deviation: f64,
    /// Deviation that triggers an anomaly
    pub threshold: f64,
    /// `normal` or `anomaly_detected`
    pub status: &'a str,
    /// Human-readable explanation
    pub reason: &'a str,
}

/// Stored decision log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogRecord {
    /// Entry ID
    pub id: String,
    /// Agent that made the decision
    pub agent: String,
    /// KPI that was checked
    pub kpi: String,
    /// Latest observed value
    pub current: f64,
    /// Mean of the history
    pub average: f64,
    /// Population standard deviation of the history
    pub std_dev: f64,
    /// Absolute distance of the current value from the mean
    pub deviation: f64,
    /// Deviation that triggers an anomaly
    pub threshold: f64,
    /// Verdict
    pub status: String,
    /// Explanation
    pub reason: String,
    /// Creation time (ISO 8601)
    pub created_at: String,
}

impl Database {
    pub(super) async fn migrate_decisions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS decision_logs (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                agent TEXT NOT NULL,
                kpi TEXT NOT NULL,
                current REAL NOT NULL,
                average REAL NOT NULL,
                std_dev REAL NOT NULL,
                deviation REAL NOT NULL,
                threshold REAL NOT NULL,
                status TEXT NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append a decision log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn insert_decision_log(
        &self,
        tenant_id: TenantId,
        entry: &NewDecisionLog<'_>,
    ) -> AppResult<DecisionLogRecord> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r"
            INSERT INTO decision_logs (id, tenant_id, agent, kpi, current, average, std_dev, deviation, threshold, status, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(&id)
        .bind(tenant_id.to_string())
        .bind(entry.agent)
        .bind(entry.kpi)
        .bind(entry.current)
        .bind(entry.average)
        .bind(entry.std_dev)
        .bind(entry.deviation)
        .bind(entry.threshold)
        .bind(entry.status)
        .bind(entry.reason)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert decision log: {e}")))?;

        Ok(DecisionLogRecord {
            id,
            agent: entry.agent.to_owned(),
            kpi: entry.kpi.to_owned(),
            current: entry.current,
            average: entry.average,
            std_dev: entry.std_dev,
            deviation: entry.deviation,
            threshold: entry.threshold,
            status: entry.status.to_owned(),
            reason: entry.reason.to_owned(),
            created_at: now,
        })
    }

    /// A tenant's decision logs, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_decision_logs(
        &self,
        tenant_id: TenantId,
        limit: i64,
    ) -> AppResult<Vec<DecisionLogRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, agent, kpi, current, average, std_dev, deviation, threshold, status, reason, created_at
            FROM decision_logs
            WHERE tenant_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list decision logs: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(DecisionLogRecord {
                    id: r.try_get("id")?,
                    agent: r.try_get("agent")?,
                    kpi: r.try_get("kpi")?,
                    current: r.try_get("current")?,
                    average: r.try_get("average")?,
                    std_dev: r.try_get("std_dev")?,
                    deviation: r.try_get("deviation")?,
                    threshold: r.try_get("threshold")?,
                    status: r.try_get("status")?,
                    reason: r.try_get("reason")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }
}
