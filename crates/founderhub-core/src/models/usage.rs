// ABOUTME: Token usage ledger entries and monthly quota status
// ABOUTME: Every successful generation appends one UsageRecord
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TenantId;
use crate::errors::AppError;

/// What kind of caller consumed the tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSource {
    /// Human-facing persona chat
    Chat,
    /// Background generation (analysis, summaries)
    Generation,
}

impl UsageSource {
    /// Column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Generation => "generation",
        }
    }
}

impl fmt::Display for UsageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "generation" => Ok(Self::Generation),
            other => Err(AppError::invalid_input(format!("Unknown usage source: {other}"))),
        }
    }
}

/// Append-only ledger entry for one successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Row identifier
    pub id: Uuid,
    /// Tenant billed for the tokens
    pub tenant_id: TenantId,
    /// User who triggered the generation
    pub user_id: Uuid,
    /// Project the generation was about, when any
    pub project_id: Option<Uuid>,
    /// Chat or background generation
    pub source: UsageSource,
    /// Name of the backend that served the call
    pub backend: String,
    /// Model that served the call
    pub model: String,
    /// Tokens consumed
    pub tokens_used: u32,
    /// When the generation completed
    pub created_at: DateTime<Utc>,
}

/// Monthly token usage against the tenant's plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Plan cap, `None` when the tenant has no subscription
    pub cap: Option<u64>,
    /// Tokens consumed since the start of the month
    pub used: u64,
}

impl QuotaStatus {
    /// Tokens left this month, `None` when uncapped
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.cap.map(|cap| cap.saturating_sub(self.used))
    }

    /// True once usage has reached the cap
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cap.is_some_and(|cap| self.used >= cap)
    }

    /// True when spending `tokens` more would exceed the cap
    #[must_use]
    pub fn would_exceed(&self, tokens: u64) -> bool {
        self.cap
            .is_some_and(|cap| self.used.saturating_add(tokens) > cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_status_arithmetic() {
        let status = QuotaStatus {
            cap: Some(1000),
            used: 950,
        };
        assert_eq!(status.remaining(), Some(50));
        assert!(!status.is_exhausted());
        assert!(status.would_exceed(800));
        assert!(!status.would_exceed(50));
    }

    #[test]
    fn test_uncapped_quota_never_exceeds() {
        let status = QuotaStatus {
            cap: None,
            used: u64::MAX,
        };
        assert_eq!(status.remaining(), None);
        assert!(!status.is_exhausted());
        assert!(!status.would_exceed(1));
    }
}
