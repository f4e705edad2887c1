// ABOUTME: Server-wide constants: service names, environment variable names and defaults
// ABOUTME: Keeps configuration keys and tunables out of the modules that read them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Constants Module
//!
//! Environment variable names and default values for the server configuration.
//! Domain constants shared with tests live in `founderhub_core::constants`.

/// Service names used in structured logs and error messages
pub mod service_names {
    /// The HTTP server
    pub const FOUNDERHUB_SERVER: &str = "founderhub-server";
    /// External persona/conversation backend
    pub const ASSISTANT_BACKEND: &str = "assistant_backend";
    /// Self-hosted GPU inference backend
    pub const GPU_BACKEND: &str = "gpu";
    /// Hosted inference backend
    pub const OPENAI_BACKEND: &str = "openai";
    /// Scheduled webhook delivery
    pub const WEBHOOK: &str = "webhook";
}

/// Environment variable names
pub mod env_vars {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Secret used to validate caller bearer tokens
    pub const JWT_SECRET: &str = "JWT_SECRET";
    /// Hosted backend API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Hosted backend base URL
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    /// Hosted backend default model
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    /// Model used when creating external personas
    pub const OPENAI_ASSISTANT_MODEL: &str = "OPENAI_ASSISTANT_MODEL";
    /// GPU backend base URL; the GPU backend is disabled when unset
    pub const GPU_BACKEND_URL: &str = "GPU_BACKEND_URL";
    /// Shared secret for signing GPU inference tokens
    pub const GPU_BACKEND_SECRET: &str = "GPU_BACKEND_SECRET";
    /// GPU backend model name
    pub const GPU_BACKEND_MODEL: &str = "GPU_BACKEND_MODEL";
    /// Lifetime of GPU inference tokens in seconds
    pub const GPU_TOKEN_TTL_SECS: &str = "GPU_TOKEN_TTL_SECS";
    /// GPU backend request timeout in seconds
    pub const GPU_TIMEOUT_SECS: &str = "GPU_TIMEOUT_SECS";
    /// Per-role model overrides, `role=model,role=model`
    pub const ROLE_MODELS: &str = "FOUNDERHUB_ROLE_MODELS";
    /// Scheduler poll interval in seconds
    pub const SCHEDULER_POLL_INTERVAL_SECS: &str = "SCHEDULER_POLL_INTERVAL_SECS";
    /// Maximum delivery attempts for a scheduled job
    pub const SCHEDULER_MAX_ATTEMPTS: &str = "SCHEDULER_MAX_ATTEMPTS";
    /// Comma separated CORS origins, `*` for any
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
}

/// Default configuration values
pub mod defaults {
    /// HTTP listen port
    pub const HTTP_PORT: u16 = 8081;
    /// Local SQLite database
    pub const DATABASE_URL: &str = "sqlite:./data/founderhub.db";
    /// Hosted backend base URL
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    /// Hosted backend default model
    pub const OPENAI_MODEL: &str = "gpt-4o";
    /// Model used when creating external personas
    pub const ASSISTANT_MODEL: &str = "gpt-4o";
    /// GPU backend model name
    pub const GPU_MODEL: &str = "mistral-7b-instruct";
    /// Lifetime of GPU inference tokens
    pub const GPU_TOKEN_TTL_SECS: u64 = 60;
    /// GPU backend request timeout
    pub const GPU_TIMEOUT_SECS: u64 = 120;
    /// Hosted backend request timeout
    pub const OPENAI_TIMEOUT_SECS: u64 = 120;
    /// Outbound connect timeout
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    /// Webhook delivery timeout
    pub const WEBHOOK_TIMEOUT_SECS: u64 = 30;
    /// Due jobs claimed per scheduler poll
    pub const SCHEDULER_BATCH_SIZE: i64 = 20;
    /// Scheduler poll interval
    pub const SCHEDULER_POLL_INTERVAL_SECS: u64 = 5;
    /// Scheduled job attempts before giving up
    pub const SCHEDULER_MAX_ATTEMPTS: u32 = 3;
    /// Whole-request timeout applied by the HTTP layer
    pub const REQUEST_TIMEOUT_SECS: u64 = 180;
}
