// ABOUTME: HTTP integration tests for persona chat, team listing and thread reset routes
// ABOUTME: Exercises the full router with fake persona and inference backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use common::{create_test_app, create_test_app_with, seed_plan, seed_usage, usage, ScriptedProvider};
use founderhub::llm::MessageRole;
use founderhub::models::TenantId;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use uuid::Uuid;

// ============================================================================
// POST /api/ideas/:idea_id/assistants/:role/chat
// ============================================================================

#[tokio::test]
async fn test_chat_creates_persona_and_returns_reply() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let response = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/CEO/chat", idea.id))
        .bearer(&app.token)
        .json(&json!({ "message": "How do we price this?" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["reply"], "GPU reply");
    assert_eq!(body["role"], "ceo");
    assert_eq!(body["backend"], "gpu");
    assert_eq!(body["assistant_id"], "asst_1");
    assert_eq!(body["thread_id"], "thread_1");
    assert!(body["remaining_tokens"].is_null());

    let log = app.database().get_chat_log(app.tenant_id, idea.id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, "user");
    assert_eq!(log[0].message, "How do we price this?");
    assert_eq!(log[1].role, "assistant");
    assert_eq!(log[1].persona, "ceo");
}

#[tokio::test]
async fn test_chat_replays_recent_history_for_the_same_persona() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let uri = format!("/api/ideas/{}/assistants/cto/chat", idea.id);

    for message in ["First question", "Second question"] {
        let response = AxumTestRequest::post(&uri)
            .bearer(&app.token)
            .json(&json!({ "message": message }))
            .send(app.router())
            .await;
        assert_eq!(response.status(), 200);
    }

    let sent = app.primary.as_ref().unwrap().last_request().unwrap();
    let roles: Vec<MessageRole> = sent.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User
        ]
    );
    assert_eq!(sent.messages[1].content, "First question");
    assert_eq!(sent.messages[3].content, "Second question");
    assert_eq!(app.assistants.assistants_created(), 1);
}

#[tokio::test]
async fn test_chat_with_blank_message_is_rejected() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let response = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/chat", idea.id))
        .bearer(&app.token)
        .json(&json!({ "message": "   " }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    assert_eq!(app.assistants.assistants_created(), 0);
}

#[tokio::test]
async fn test_chat_with_invalid_role_is_rejected() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let response = AxumTestRequest::post(&format!(
        "/api/ideas/{}/assistants/chief%20officer/chat",
        idea.id
    ))
    .bearer(&app.token)
    .json(&json!({ "message": "Hi" }))
    .send(app.router())
    .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_chat_on_unknown_idea_is_not_found() {
    let app = create_test_app().await;

    let response = AxumTestRequest::post(&format!(
        "/api/ideas/{}/assistants/ceo/chat",
        Uuid::new_v4()
    ))
    .bearer(&app.token)
    .json(&json!({ "message": "Hi" }))
    .send(app.router())
    .await;

    assert_eq!(response.status(), 404);
    assert_eq!(app.assistants.assistants_created(), 0);
}

#[tokio::test]
async fn test_chat_on_another_users_idea_is_not_found() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let stranger = app.token_for(Uuid::new_v4(), app.tenant_id);

    let response = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/chat", idea.id))
        .bearer(&stranger)
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_chat_when_every_backend_fails_is_bad_gateway() {
    let app = create_test_app_with(
        Some(Arc::new(ScriptedProvider::failing("gpu"))),
        Arc::new(ScriptedProvider::failing("openai")),
    )
    .await;
    let idea = app.seed_idea("Acme").await;

    let response = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/chat", idea.id))
        .bearer(&app.token)
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 502);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "GENERATION_FAILED");
    let log = app.database().get_chat_log(app.tenant_id, idea.id).await.unwrap();
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_chat_over_quota_returns_429() {
    let app = create_test_app_with(
        None,
        Arc::new(ScriptedProvider::replying("openai", "Long answer", Some(usage(800)))),
    )
    .await;
    let idea = app.seed_idea("Acme").await;
    seed_plan(app.database(), app.tenant_id, 1000).await;
    seed_usage(app.database(), app.tenant_id, app.user_id, 950).await;

    let response = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/chat", idea.id))
        .bearer(&app.token)
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 429);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_chat_requires_bearer_token() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let response = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/chat", idea.id))
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_chat_rejects_malformed_and_forged_tokens() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let uri = format!("/api/ideas/{}/assistants/ceo/chat", idea.id);

    let basic = AxumTestRequest::post(&uri)
        .header("authorization", "Basic dXNlcjpwYXNz")
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;
    assert_eq!(basic.status(), 401);

    let forged = founderhub::auth::AuthManager::new(b"some-other-secret")
        .generate_token(
            &founderhub::auth::AuthContext {
                user_id: app.user_id,
                tenant_id: app.tenant_id,
            },
            chrono::Duration::hours(1),
        )
        .unwrap();
    let response = AxumTestRequest::post(&uri)
        .bearer(&forged)
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_INVALID");
}

#[tokio::test]
async fn test_expired_token_is_reported_as_expired() {
    let app = create_test_app().await;
    let expired = app
        .resources
        .auth_manager
        .generate_token(
            &founderhub::auth::AuthContext {
                user_id: app.user_id,
                tenant_id: app.tenant_id,
            },
            chrono::Duration::seconds(-60),
        )
        .unwrap();

    let response = AxumTestRequest::get("/api/ideas")
        .bearer(&expired)
        .send(app.router())
        .await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_EXPIRED");
}

// ============================================================================
// GET /api/ideas/:idea_id/team and POST .../threads
// ============================================================================

#[tokio::test]
async fn test_team_lists_personas_after_chats() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    for role in ["ceo", "cmo"] {
        let response =
            AxumTestRequest::post(&format!("/api/ideas/{}/assistants/{role}/chat", idea.id))
                .bearer(&app.token)
                .json(&json!({ "message": "Hi" }))
                .send(app.router())
                .await;
        assert_eq!(response.status(), 200);
    }

    let response = AxumTestRequest::get(&format!("/api/ideas/{}/team", idea.id))
        .bearer(&app.token)
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["idea_id"], idea.id.to_string());
    let roles: Vec<&str> = body["team"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles.len(), 2);
    assert!(roles.contains(&"ceo"));
    assert!(roles.contains(&"cmo"));
}

#[tokio::test]
async fn test_team_without_personas_is_not_found() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let response = AxumTestRequest::get(&format!("/api/ideas/{}/team", idea.id))
        .bearer(&app.token)
        .send(app.router())
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_team_is_tenant_scoped() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let outsider = app.token_for(app.user_id, TenantId::new());

    let response = AxumTestRequest::get(&format!("/api/ideas/{}/team", idea.id))
        .bearer(&outsider)
        .send(app.router())
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_new_thread_keeps_persona() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let chat = AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/chat", idea.id))
        .bearer(&app.token)
        .json(&json!({ "message": "Hi" }))
        .send(app.router())
        .await;
    assert_eq!(chat.status(), 200);

    let response =
        AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/threads", idea.id))
            .bearer(&app.token)
            .send(app.router())
            .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json();
    assert_eq!(body["assistant_id"], "asst_1");
    assert_eq!(body["thread_id"], "thread_2");
}

#[tokio::test]
async fn test_new_thread_before_any_chat_is_not_found() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let response =
        AxumTestRequest::post(&format!("/api/ideas/{}/assistants/ceo/threads", idea.id))
            .bearer(&app.token)
            .send(app.router())
            .await;

    assert_eq!(response.status(), 404);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = create_test_app().await;

    let generated = AxumTestRequest::get("/health").send(app.router()).await;
    assert!(generated.header("x-request-id").is_some());

    let echoed = AxumTestRequest::get("/health")
        .header("x-request-id", "req-abc-123")
        .send(app.router())
        .await;
    assert_eq!(echoed.header("x-request-id").as_deref(), Some("req-abc-123"));
}
