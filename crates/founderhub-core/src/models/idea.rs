// ABOUTME: Startup idea (project) records and their generated summaries
// ABOUTME: The idea title and solution supply persona instructions with context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TenantId;
use crate::constants::DEFAULT_IDEA_SUMMARY;

/// A founder's startup idea; the "project" personas are created for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    /// Identifier
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Owning user
    pub user_id: Uuid,
    /// Short name of the idea
    pub title: String,
    /// Problem being solved
    pub problem: String,
    /// Target audience
    pub audience: String,
    /// Proposed solution, used as the idea summary
    pub solution: String,
    /// Free-form founder notes
    pub notes: Option<String>,
    /// `"pending"` until analyzed, then `"analyzed"`
    pub vetting_status: String,
    /// Critique returned by the analysis
    pub vetting_response: Option<String>,
    /// Tokens spent on the last analysis
    pub tokens_used: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Summary text for instruction templates, with a default when blank
    #[must_use]
    pub fn summary_or_default(&self) -> &str {
        let trimmed = self.solution.trim();
        if trimmed.is_empty() {
            DEFAULT_IDEA_SUMMARY
        } else {
            trimmed
        }
    }
}

/// Generated summary and recommended team for an idea
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaSummary {
    /// Idea the summary belongs to
    pub idea_id: Uuid,
    /// Summary text
    pub summary: String,
    /// Recommended team section, empty when the reply had none
    pub recommended_team: String,
    /// Last regeneration time
    pub updated_at: DateTime<Utc>,
}
