// ABOUTME: Main library entry point for the FounderHub backend
// ABOUTME: Persona sessions, the AI invocation gateway and the REST API around them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

#![deny(unsafe_code)]

//! # FounderHub
//!
//! Backend for founders working with a team of AI personas (CEO, CTO,
//! marketing lead, critic and so on) on their startup ideas.
//!
//! ## Features
//!
//! - **Session resolution**: one external persona and conversation thread per
//!   tenant, user, idea and role, created on first use
//! - **AI gateway**: a self-hosted GPU backend tried first, a hosted backend
//!   as fallback, with token accounting for every successful generation
//! - **Quotas**: monthly token caps per tenant plan
//! - **Scheduler**: durable jobs that survive restarts and retry with backoff
//! - **CRM and analytics**: leads, follow-ups and KPI anomaly checks
//!
//! ## Architecture
//!
//! - **Resources**: every external client is built once and injected
//! - **Services**: chat and idea workflows on top of the resolver and gateway
//! - **Routes**: thin axum handlers that authenticate and delegate
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use founderhub::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("FounderHub configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// KPI anomaly detection
pub mod analytics;

/// External persona backend and the session resolver
pub mod assistants;

/// Bearer token authentication for API callers
pub mod auth;

/// Configuration management
pub mod config;

/// Environment variable names and defaults
pub mod constants;

/// `SQLite` persistence
pub mod database;

/// AI invocation gateway with primary/secondary fallback and usage accounting
pub mod gateway;

/// Chat completion clients for the inference backends
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware layers
pub mod middleware;

/// Dependency container shared by routes and workers
pub mod resources;

/// REST API routes
pub mod routes;

/// Durable job scheduler
pub mod scheduler;

/// Chat, idea and quota workflows
pub mod services;

pub use founderhub_core::{errors, models};
