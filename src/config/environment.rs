// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses database, auth, inference backend, scheduler and CORS settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! Environment-based configuration management

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{defaults, env_vars};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL (`sqlite:path` or `sqlite::memory:`)
    pub url: String,
}

/// Caller authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret used to validate caller bearer tokens
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// Hosted (secondary) inference backend configuration
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Static bearer credential
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Default chat model
    pub model: String,
    /// Model used when creating external personas
    pub assistant_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("assistant_model", &self.assistant_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Self-hosted GPU (primary) inference backend configuration
#[derive(Clone)]
pub struct GpuBackendConfig {
    /// API base URL
    pub base_url: String,
    /// Shared secret used to sign short-lived inference tokens
    pub signing_secret: String,
    /// Model served by the GPU backend
    pub model: String,
    /// Lifetime of each inference token
    pub token_ttl_secs: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl fmt::Debug for GpuBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBackendConfig")
            .field("base_url", &self.base_url)
            .field("signing_secret", &"[REDACTED]")
            .field("model", &self.model)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Inference configuration for both backends
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Secondary backend, always present
    pub openai: OpenAiConfig,
    /// Primary backend, absent when `GPU_BACKEND_URL` is unset
    pub gpu: Option<GpuBackendConfig>,
    /// Lowercase role tag to model name overrides
    pub role_models: HashMap<String, String>,
}

/// Durable job scheduler configuration
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Seconds between polls for due jobs
    pub poll_interval_secs: u64,
    /// Attempts before a job is marked failed
    pub max_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::SCHEDULER_POLL_INTERVAL_SECS,
            max_attempts: defaults::SCHEDULER_MAX_ATTEMPTS,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database settings
    pub database: DatabaseConfig,
    /// Caller authentication settings
    pub auth: AuthConfig,
    /// Inference backend settings
    pub llm: LlmConfig,
    /// Job scheduler settings
    pub scheduler: SchedulerConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: parse_env_or(env_vars::HTTP_PORT, defaults::HTTP_PORT)?,
            environment: Environment::from_str_or_default(&env_var_or(
                env_vars::ENVIRONMENT,
                "development",
            )),
            database: DatabaseConfig {
                url: env_var_or(env_vars::DATABASE_URL, defaults::DATABASE_URL),
            },
            auth: AuthConfig {
                jwt_secret: required_env(env_vars::JWT_SECRET)?,
            },
            llm: LlmConfig {
                openai: OpenAiConfig {
                    api_key: required_env(env_vars::OPENAI_API_KEY)?,
                    base_url: env_var_or(env_vars::OPENAI_BASE_URL, defaults::OPENAI_BASE_URL),
                    model: env_var_or(env_vars::OPENAI_MODEL, defaults::OPENAI_MODEL),
                    assistant_model: env_var_or(
                        env_vars::OPENAI_ASSISTANT_MODEL,
                        defaults::ASSISTANT_MODEL,
                    ),
                    timeout_secs: defaults::OPENAI_TIMEOUT_SECS,
                },
                gpu: gpu_backend_from_env()?,
                role_models: parse_role_models(&env_var_or(env_vars::ROLE_MODELS, "")),
            },
            scheduler: SchedulerConfig {
                poll_interval_secs: parse_env_or(
                    env_vars::SCHEDULER_POLL_INTERVAL_SECS,
                    defaults::SCHEDULER_POLL_INTERVAL_SECS,
                )?,
                max_attempts: parse_env_or(
                    env_vars::SCHEDULER_MAX_ATTEMPTS,
                    defaults::SCHEDULER_MAX_ATTEMPTS,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&env_var_or(env_vars::CORS_ALLOWED_ORIGINS, "*")),
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for values that would make the server unusable
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(anyhow!("{} must not be empty", env_vars::JWT_SECRET));
        }
        if self.scheduler.poll_interval_secs == 0 {
            return Err(anyhow!(
                "{} must be greater than zero",
                env_vars::SCHEDULER_POLL_INTERVAL_SECS
            ));
        }
        if self.scheduler.max_attempts == 0 {
            return Err(anyhow!(
                "{} must be greater than zero",
                env_vars::SCHEDULER_MAX_ATTEMPTS
            ));
        }
        if self.llm.gpu.is_none() {
            warn!("GPU backend not configured; all generations go to the hosted backend");
        }
        if self.environment.is_production() && self.cors.allowed_origins.iter().any(|o| o == "*") {
            warn!("CORS allows any origin in production");
        }
        Ok(())
    }

    /// Model for a role on the hosted backend, honouring overrides
    #[must_use]
    pub fn model_for_role(&self, role: &str) -> &str {
        self.llm
            .role_models
            .get(role)
            .map_or(self.llm.openai.model.as_str(), String::as_str)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "FounderHub Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Primary Backend: {}\n\
             - Secondary Backend: {} ({})\n\
             - Role Model Overrides: {}\n\
             - Scheduler Poll Interval: {}s\n\
             - CORS Origins: {}",
            self.http_port,
            self.environment,
            if self.database.url.contains(":memory:") {
                "SQLite (in-memory)"
            } else {
                "SQLite"
            },
            self.llm
                .gpu
                .as_ref()
                .map_or_else(|| "Disabled".to_owned(), |gpu| format!("{} ({})", gpu.base_url, gpu.model)),
            self.llm.openai.base_url,
            self.llm.openai.model,
            self.llm.role_models.len(),
            self.scheduler.poll_interval_secs,
            self.cors.allowed_origins.join(", "),
        )
    }
}

fn gpu_backend_from_env() -> Result<Option<GpuBackendConfig>> {
    let Ok(base_url) = env::var(env_vars::GPU_BACKEND_URL) else {
        return Ok(None);
    };
    if base_url.trim().is_empty() {
        return Ok(None);
    }
    let signing_secret = required_env(env_vars::GPU_BACKEND_SECRET)
        .context("GPU backend URL is set but its signing secret is missing")?;

    Ok(Some(GpuBackendConfig {
        base_url,
        signing_secret,
        model: env_var_or(env_vars::GPU_BACKEND_MODEL, defaults::GPU_MODEL),
        token_ttl_secs: parse_env_or(env_vars::GPU_TOKEN_TTL_SECS, defaults::GPU_TOKEN_TTL_SECS)?,
        timeout_secs: parse_env_or(env_vars::GPU_TIMEOUT_SECS, defaults::GPU_TIMEOUT_SECS)?,
    }))
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn required_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} environment variable is required"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Parse comma-separated origins
fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `role=model` pairs; role keys are lowercased, malformed pairs skipped
fn parse_role_models(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (role, model) = pair.split_once('=')?;
            let role = role.trim().to_lowercase();
            let model = model.trim();
            if role.is_empty() || model.is_empty() {
                warn!(pair = %pair, "Ignoring malformed role model override");
                return None;
            }
            Some((role, model.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://app.example.com"),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_parse_role_models() {
        let models = parse_role_models("Summarizer=gpt-4o-mini, ceo = gpt-4o ,broken,=x");
        assert_eq!(models.len(), 2);
        assert_eq!(models.get("summarizer").map(String::as_str), Some("gpt-4o-mini"));
        assert_eq!(models.get("ceo").map(String::as_str), Some("gpt-4o"));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
        assert_eq!(
            Environment::from_str_or_default("whatever"),
            Environment::Development
        );
    }
}
