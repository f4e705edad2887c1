// ABOUTME: Centralized resource container for dependency injection into routes and workers
// ABOUTME: Builds the database-backed services around explicitly supplied external clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Server Resources
//!
//! Every external collaborator (assistant service, inference backends, job
//! handlers) is constructed once and passed in. Tests swap in fakes through
//! [`ExternalClients`]; the server binary uses [`ServerResources::from_config`].

use std::sync::Arc;
use std::time::Duration;

use crate::analytics::AnomalyDetector;
use crate::assistants::{
    AssistantBackend, OpenAiAssistantsClient, OpenAiAssistantsConfig, SessionResolver,
};
use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::gateway::AiGateway;
use crate::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::scheduler::{JobHandler, JobScheduler, WebhookJobHandler};
use founderhub_core::errors::AppResult;

/// External collaborators the services are built around
#[derive(Clone)]
pub struct ExternalClients {
    /// Persona and thread provider
    pub assistants: Arc<dyn AssistantBackend>,
    /// Inference backend tried first, if any
    pub primary_llm: Option<Arc<dyn LlmProvider>>,
    /// Inference backend tried last
    pub secondary_llm: Arc<dyn LlmProvider>,
    /// Scheduled job handlers
    pub job_handlers: Vec<Arc<dyn JobHandler>>,
}

impl ExternalClients {
    /// Real HTTP clients for the configured services
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let openai = &config.llm.openai;
        let assistants = OpenAiAssistantsClient::new(OpenAiAssistantsConfig {
            base_url: openai.base_url.clone(),
            api_key: openai.api_key.clone(),
            timeout: Duration::from_secs(openai.timeout_secs),
        })?;

        let primary_llm: Option<Arc<dyn LlmProvider>> = match &config.llm.gpu {
            Some(gpu) => Some(Arc::new(OpenAiCompatibleProvider::new(
                OpenAiCompatibleConfig::gpu(gpu),
            )?)),
            None => None,
        };
        let secondary_llm: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::new(
            OpenAiCompatibleConfig::openai(openai),
        )?);

        Ok(Self {
            assistants: Arc::new(assistants),
            primary_llm,
            secondary_llm,
            job_handlers: vec![Arc::new(WebhookJobHandler::new()?)],
        })
    }
}

/// Shared server resources
#[derive(Clone)]
pub struct ServerResources {
    /// Persistence
    pub database: Arc<Database>,
    /// Caller authentication
    pub auth_manager: Arc<AuthManager>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Session resolver
    pub resolver: Arc<SessionResolver>,
    /// AI invocation gateway
    pub gateway: Arc<AiGateway>,
    /// Durable job scheduler
    pub scheduler: Arc<JobScheduler>,
    /// KPI anomaly detector
    pub anomaly_detector: AnomalyDetector,
}

impl ServerResources {
    /// Wire the services around `clients`
    #[must_use]
    pub fn new(database: Database, config: Arc<ServerConfig>, clients: ExternalClients) -> Self {
        let database = Arc::new(database);
        let auth_manager = Arc::new(AuthManager::new(config.auth.jwt_secret.as_bytes()));

        let resolver = Arc::new(SessionResolver::new(
            database.clone(),
            clients.assistants,
            config.llm.openai.assistant_model.clone(),
        ));
        let gateway = Arc::new(AiGateway::new(
            clients.primary_llm,
            clients.secondary_llm,
            database.clone(),
            config.llm.role_models.clone(),
        ));
        let scheduler = Arc::new(
            clients
                .job_handlers
                .into_iter()
                .fold(
                    JobScheduler::new(database.clone(), config.scheduler),
                    JobScheduler::with_handler,
                ),
        );

        Self {
            database,
            auth_manager,
            config,
            resolver,
            gateway,
            scheduler,
            anomaly_detector: AnomalyDetector::default(),
        }
    }

    /// Wire the services around real HTTP clients
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created
    pub fn from_config(database: Database, config: Arc<ServerConfig>) -> AppResult<Self> {
        let clients = ExternalClients::from_config(&config)?;
        Ok(Self::new(database, config, clients))
    }
}
