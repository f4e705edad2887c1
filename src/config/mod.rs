// ABOUTME: Configuration module for centralized server settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! Configuration module
//!
//! All configuration is read from environment variables at start-up; there
//! are no configuration files.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AuthConfig, CorsConfig, DatabaseConfig, Environment, GpuBackendConfig, LlmConfig,
    OpenAiConfig, SchedulerConfig, ServerConfig,
};
