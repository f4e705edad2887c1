// ABOUTME: Tracing subscriber setup for the FounderHub server and domain event helpers
// ABOUTME: Output format and verbosity come from RUST_LOG, LOG_FORMAT and ENVIRONMENT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! Structured logging
//!
//! Production deployments log JSON with source locations; everything else
//! defaults to the human-readable formatter. Chatty dependencies are capped
//! at `warn` unless `RUST_LOG` says otherwise.

use std::env;
use std::io;
use std::str::FromStr;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::Environment;
use crate::constants::service_names;

/// Directives appended after the base level
const DEPENDENCY_DIRECTIVES: &[&str] = &[
    "hyper=warn",
    "reqwest=warn",
    "sqlx=warn",
    "tower_http=info",
];

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-field human-readable output
    #[default]
    Pretty,
    /// Single-line output
    Compact,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        })
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level, or a full `EnvFilter` directive string
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Emit file and line of each event
    pub include_location: bool,
    /// Emit span open and close events
    pub include_spans: bool,
    /// Deployment environment
    pub environment: Environment,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            environment: Environment::Development,
        }
    }
}

impl LoggingConfig {
    /// Read settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_default(),
        );
        let format = env::var("LOG_FORMAT").map_or_else(
            |_| {
                if environment.is_production() {
                    LogFormat::Json
                } else {
                    LogFormat::Pretty
                }
            },
            |raw| raw.parse().unwrap_or_default(),
        );

        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()),
            format,
            include_location: environment.is_production()
                || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            environment,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        DEPENDENCY_DIRECTIVES
            .iter()
            .filter_map(|directive| directive.parse().ok())
            .fold(EnvFilter::new(&self.level), EnvFilter::add_directive)
    }

    fn format_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Json => base.json().with_current_span(true).boxed(),
            LogFormat::Pretty => base.with_target(true).boxed(),
            LogFormat::Compact => base.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.format_layer())
            .with(self.env_filter())
            .try_init()?;

        info!(
            service.name = service_names::FOUNDERHUB_SERVER,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Install the global subscriber from the process environment
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Domain event logging helpers
pub struct AppLogger;

impl AppLogger {
    /// A generation was served and billed
    pub fn log_generation(
        tenant_id: &str,
        backend: &str,
        model: &str,
        tokens: u32,
        usage_reported: bool,
        duration_ms: u64,
    ) {
        info!(
            tenant.id = %tenant_id,
            llm.backend = %backend,
            llm.model = %model,
            llm.tokens = tokens,
            llm.usage_reported = usage_reported,
            llm.duration_ms = duration_ms,
            "AI generation completed"
        );
    }

    /// A persona session was created on first use
    pub fn log_session_created(tenant_id: &str, project_id: &str, role: &str, assistant_id: &str) {
        info!(
            tenant.id = %tenant_id,
            project.id = %project_id,
            persona.role = %role,
            persona.assistant_id = %assistant_id,
            "Assistant session created"
        );
    }

    /// The monthly quota rejected a request
    pub fn log_quota_rejection(tenant_id: &str, used: u64, cap: u64, requested: u64) {
        warn!(
            tenant.id = %tenant_id,
            quota.used = used,
            quota.cap = cap,
            quota.requested = requested,
            "Monthly token quota exceeded"
        );
    }

    /// A caller failed authentication
    pub fn log_auth_failure(reason: &str) {
        warn!(auth.reason = %reason, "Authentication failed");
    }
}
