// ABOUTME: Core data models for the FounderHub backend
// ABOUTME: Re-exports tenant identifiers, persona roles, sessions, usage and idea types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Data Models
//!
//! Plain data types shared by the database layer, the services and the HTTP
//! routes. Persistence concerns (column encoding) live in the server crate.

mod idea;
mod role;
mod session;
mod tenant;
mod usage;

pub use idea::{Idea, IdeaSummary};
pub use role::PersonaRole;
pub use session::{AssistantSession, PromptTemplate, SessionKey};
pub use tenant::TenantId;
pub use usage::{QuotaStatus, UsageRecord, UsageSource};
