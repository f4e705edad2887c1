// ABOUTME: Shared constants for persona roles, usage scopes and default texts
// ABOUTME: Used by the resolver, gateway and services so literals live in one place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

/// Persona role tags with special meaning to the services
pub mod roles {
    /// Role used to critique a freshly submitted idea
    pub const STARTUP_CRITIC: &str = "startup_critic";
    /// Role used to summarize an idea and its conversation
    pub const SUMMARIZER: &str = "summarizer";
}

/// Placeholders recognised in prompt templates
pub mod placeholders {
    /// Project (idea) name
    pub const IDEA_NAME: &str = "idea_name";
    /// Project (idea) summary
    pub const IDEA_SUMMARY: &str = "idea_summary";
}

/// Summary substituted when a project has no descriptive text yet
pub const DEFAULT_IDEA_SUMMARY: &str = "No summary provided yet.";

/// Scope claim carried by short-lived inference tokens
pub const INFERENCE_TOKEN_SCOPE: &str = "inference";

/// Marker splitting a summarizer reply into summary and recommended team
pub const RECOMMENDED_TEAM_MARKER: &str = "Recommended Team:";

/// Heading decoration summarizers wrap around the marker, e.g. `**👥 Recommended Team:**`
pub const MARKER_DECORATION: [char; 4] = ['*', '#', '\u{1F465}', '\u{FE0F}'];

/// Number of prior chat messages replayed into a persona prompt
pub const CHAT_HISTORY_WINDOW: i64 = 10;
