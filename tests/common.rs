// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, auth and fake external client helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `founderhub`
//!
//! External collaborators are replaced by in-process fakes so tests can
//! script backend failures and count outbound calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use founderhub::{
    assistants::{AssistantBackend, AssistantSpec},
    auth::AuthContext,
    config::{
        AuthConfig, CorsConfig, DatabaseConfig, Environment, LlmConfig, OpenAiConfig,
        SchedulerConfig, ServerConfig,
    },
    database::{Database, NewIdea, NewUsageRecord},
    errors::{AppError, AppResult},
    llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, TokenUsage},
    models::{Idea, TenantId, UsageSource},
    resources::{ExternalClients, ServerResources},
    routes,
    scheduler::JobHandler,
};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-founderhub";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory test database with migrations applied
pub async fn create_test_database() -> Database {
    init_test_logging();
    let database = Database::new("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    database.migrate().await.expect("Failed to migrate");
    database
}

/// Configuration with test secrets and no GPU backend section
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        },
        llm: LlmConfig {
            openai: OpenAiConfig {
                api_key: "sk-test".to_owned(),
                base_url: "http://localhost:9".to_owned(),
                model: "gpt-4o".to_owned(),
                assistant_model: "gpt-4o".to_owned(),
                timeout_secs: 5,
            },
            gpu: None,
            role_models: HashMap::new(),
        },
        scheduler: SchedulerConfig {
            poll_interval_secs: 1,
            max_attempts: 3,
        },
        cors: CorsConfig::default(),
    }
}

// ============================================================================
// Fake assistant backend
// ============================================================================

/// In-process persona backend that counts every call
#[derive(Default)]
pub struct FakeAssistantBackend {
    pub assistants_created: AtomicUsize,
    pub threads_created: AtomicUsize,
    pub assistants_deleted: AtomicUsize,
    pub threads_deleted: AtomicUsize,
    pub fail_threads: AtomicBool,
    pub create_delay: Option<Duration>,
    pub thread_delay: Option<Duration>,
    pub specs: Mutex<Vec<AssistantSpec>>,
}

impl FakeAssistantBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that sleeps inside `create_assistant`, widening race windows
    pub fn slow(delay: Duration) -> Self {
        Self {
            create_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Backend that sleeps inside `create_thread`
    pub fn slow_threads(delay: Duration) -> Self {
        Self {
            thread_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn assistants_created(&self) -> usize {
        self.assistants_created.load(Ordering::SeqCst)
    }

    pub fn threads_created(&self) -> usize {
        self.threads_created.load(Ordering::SeqCst)
    }

    pub fn assistants_deleted(&self) -> usize {
        self.assistants_deleted.load(Ordering::SeqCst)
    }

    pub fn threads_deleted(&self) -> usize {
        self.threads_deleted.load(Ordering::SeqCst)
    }

    pub fn last_spec(&self) -> Option<AssistantSpec> {
        self.specs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AssistantBackend for FakeAssistantBackend {
    fn name(&self) -> &str {
        "fake_assistants"
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> AppResult<String> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.assistants_created.fetch_add(1, Ordering::SeqCst) + 1;
        self.specs.lock().unwrap().push(spec.clone());
        Ok(format!("asst_{n}"))
    }

    async fn create_thread(&self) -> AppResult<String> {
        if let Some(delay) = self.thread_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_threads.load(Ordering::SeqCst) {
            return Err(AppError::external_service(
                "fake_assistants",
                "thread creation refused",
            ));
        }
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_{n}"))
    }

    async fn delete_assistant(&self, _assistant_id: &str) -> AppResult<()> {
        self.assistants_deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_thread(&self, _thread_id: &str) -> AppResult<()> {
        self.threads_deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Scripted inference backend
// ============================================================================

/// Inference backend that always replies the same way and records requests
pub struct ScriptedProvider {
    name: String,
    model: String,
    reply: Option<(String, Option<TokenUsage>)>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Backend answering `content`, reporting `usage` when given
    pub fn replying(name: &str, content: &str, usage: Option<TokenUsage>) -> Self {
        Self {
            name: name.to_owned(),
            model: format!("{name}-model"),
            reply: Some((content.to_owned(), usage)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose every call fails
    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            model: format!("{name}-model"),
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> LlmCapabilities {
        match &self.reply {
            Some((_, Some(_))) => LlmCapabilities::USAGE_REPORTING,
            _ => LlmCapabilities::empty(),
        }
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some((content, usage)) => Ok(ChatResponse {
                content: content.clone(),
                model: request.model.clone().unwrap_or_else(|| self.model.clone()),
                usage: *usage,
                finish_reason: Some("stop".to_owned()),
            }),
            None => Err(AppError::external_service(&self.name, "backend unavailable")),
        }
    }
}

/// Usage block reporting `total` tokens
pub const fn usage(total: u32) -> TokenUsage {
    TokenUsage {
        prompt_tokens: 0,
        completion_tokens: total,
        total_tokens: total,
    }
}

// ============================================================================
// Application fixture
// ============================================================================

/// Wired resources plus handles on every fake
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    pub assistants: Arc<FakeAssistantBackend>,
    pub primary: Option<Arc<ScriptedProvider>>,
    pub secondary: Arc<ScriptedProvider>,
    pub tenant_id: TenantId,
    pub user_id: Uuid,
    pub token: String,
}

impl TestApp {
    /// Full router including middleware
    pub fn router(&self) -> Router {
        routes::build_app(&self.resources)
    }

    pub fn database(&self) -> &Database {
        &self.resources.database
    }

    /// Bearer token for another user, optionally in another tenant
    pub fn token_for(&self, user_id: Uuid, tenant_id: TenantId) -> String {
        self.resources
            .auth_manager
            .generate_token(&AuthContext { user_id, tenant_id }, chrono::Duration::hours(1))
            .unwrap()
    }

    /// Idea owned by the fixture user
    pub async fn seed_idea(&self, title: &str) -> Idea {
        seed_idea(self.database(), self.tenant_id, self.user_id, title).await
    }
}

/// App whose GPU backend replies without usage and hosted backend reports usage
pub async fn create_test_app() -> TestApp {
    create_test_app_with(
        Some(Arc::new(ScriptedProvider::replying("gpu", "GPU reply", None))),
        Arc::new(ScriptedProvider::replying(
            "openai",
            "Hosted reply",
            Some(usage(42)),
        )),
    )
    .await
}

/// App with the given inference backends
pub async fn create_test_app_with(
    primary: Option<Arc<ScriptedProvider>>,
    secondary: Arc<ScriptedProvider>,
) -> TestApp {
    create_test_app_full(primary, secondary, Arc::new(FakeAssistantBackend::new())).await
}

/// App with every external client supplied by the caller
pub async fn create_test_app_full(
    primary: Option<Arc<ScriptedProvider>>,
    secondary: Arc<ScriptedProvider>,
    assistants: Arc<FakeAssistantBackend>,
) -> TestApp {
    build_test_app(primary, secondary, assistants, Vec::new()).await
}

/// Default app whose scheduler accepts the given job kinds
pub async fn create_test_app_with_jobs(job_handlers: Vec<Arc<dyn JobHandler>>) -> TestApp {
    build_test_app(
        Some(Arc::new(ScriptedProvider::replying("gpu", "GPU reply", None))),
        Arc::new(ScriptedProvider::replying(
            "openai",
            "Hosted reply",
            Some(usage(42)),
        )),
        Arc::new(FakeAssistantBackend::new()),
        job_handlers,
    )
    .await
}

async fn build_test_app(
    primary: Option<Arc<ScriptedProvider>>,
    secondary: Arc<ScriptedProvider>,
    assistants: Arc<FakeAssistantBackend>,
    job_handlers: Vec<Arc<dyn JobHandler>>,
) -> TestApp {
    let database = create_test_database().await;
    let clients = ExternalClients {
        assistants: assistants.clone(),
        primary_llm: primary.clone().map(|p| p as Arc<dyn LlmProvider>),
        secondary_llm: secondary.clone(),
        job_handlers,
    };
    let resources = Arc::new(ServerResources::new(
        database,
        Arc::new(test_config()),
        clients,
    ));

    let tenant_id = TenantId::new();
    let user_id = Uuid::new_v4();
    let token = resources
        .auth_manager
        .generate_token(&AuthContext { user_id, tenant_id }, chrono::Duration::hours(1))
        .unwrap();

    TestApp {
        resources,
        assistants,
        primary,
        secondary,
        tenant_id,
        user_id,
        token,
    }
}

// ============================================================================
// Seed helpers
// ============================================================================

pub fn new_idea(title: &str) -> NewIdea {
    NewIdea {
        title: title.to_owned(),
        problem: "Founders waste weeks on market research".to_owned(),
        audience: "First-time founders".to_owned(),
        solution: "An AI team that vets ideas in minutes".to_owned(),
        notes: None,
    }
}

pub async fn seed_idea(database: &Database, tenant_id: TenantId, user_id: Uuid, title: &str) -> Idea {
    database
        .create_idea(tenant_id, user_id, &new_idea(title))
        .await
        .expect("Failed to seed idea")
}

/// Subscribe the tenant to a fresh plan capped at `cap` tokens
pub async fn seed_plan(database: &Database, tenant_id: TenantId, cap: u64) {
    let plan_id = database
        .upsert_plan(&format!("plan-{cap}"), cap)
        .await
        .expect("Failed to seed plan");
    database
        .assign_plan(tenant_id, plan_id)
        .await
        .expect("Failed to assign plan");
}

/// Append a ledger entry as if a generation had already spent `tokens`
pub async fn seed_usage(database: &Database, tenant_id: TenantId, user_id: Uuid, tokens: u32) {
    database
        .record_usage(&NewUsageRecord {
            tenant_id,
            user_id,
            project_id: None,
            source: UsageSource::Chat,
            backend: "openai",
            model: "gpt-4o",
            tokens_used: tokens,
        })
        .await
        .expect("Failed to seed usage");
}
