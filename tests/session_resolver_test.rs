// ABOUTME: Integration tests for the persona session resolver
// ABOUTME: Covers reuse, lazy creation, creation races, cleanup and instruction rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{create_test_app, create_test_app_full, FakeAssistantBackend, ScriptedProvider};
use founderhub::errors::ErrorCode;
use founderhub::models::{PersonaRole, SessionKey, TenantId};
use uuid::Uuid;

fn role(tag: &str) -> PersonaRole {
    PersonaRole::parse(tag).unwrap()
}

#[tokio::test]
async fn test_first_resolve_creates_persona_and_thread() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("ceo"));

    let session = app.resources.resolver.resolve(&key).await.unwrap();

    assert_eq!(session.assistant_id, "asst_1");
    assert_eq!(session.thread_id, "thread_1");
    assert_eq!(session.project_id, idea.id);
    assert_eq!(app.assistants.assistants_created(), 1);
    assert_eq!(app.assistants.threads_created(), 1);

    let spec = app.assistants.last_spec().unwrap();
    assert_eq!(spec.name, "Acme CEO");
    assert_eq!(spec.model, "gpt-4o");
    assert_eq!(
        spec.instructions,
        "You are the CEO of a startup. Help the founder make high-quality decisions."
    );
}

#[tokio::test]
async fn test_second_resolve_reuses_session_without_external_calls() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("cto"));

    let first = app.resources.resolver.ensure_assistant(&key).await.unwrap();
    let second = app.resources.resolver.ensure_assistant(&key).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(app.assistants.assistants_created(), 1);
    assert_eq!(app.assistants.threads_created(), 1);
}

#[tokio::test]
async fn test_role_tags_are_case_insensitive() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    let upper = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("CEO"));
    let lower = SessionKey::new(app.tenant_id, app.user_id, idea.id, role(" ceo "));

    let a = app.resources.resolver.ensure_assistant(&upper).await.unwrap();
    let b = app.resources.resolver.ensure_assistant(&lower).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(app.assistants.assistants_created(), 1);
}

#[tokio::test]
async fn test_distinct_roles_get_distinct_personas() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;

    for tag in ["ceo", "cto", "cmo"] {
        let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role(tag));
        app.resources.resolver.resolve(&key).await.unwrap();
    }

    let team = app
        .resources
        .resolver
        .list_team(app.tenant_id, app.user_id, idea.id)
        .await
        .unwrap();
    assert_eq!(team.len(), 3);
    assert_eq!(app.assistants.assistants_created(), 3);
}

#[tokio::test]
async fn test_missing_project_is_not_found_and_makes_no_external_calls() {
    let app = create_test_app().await;
    let key = SessionKey::new(app.tenant_id, app.user_id, Uuid::new_v4(), role("ceo"));

    let err = app.resources.resolver.resolve(&key).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert_eq!(app.assistants.assistants_created(), 0);
    assert_eq!(app.assistants.threads_created(), 0);
}

#[tokio::test]
async fn test_project_lookup_is_tenant_scoped() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let other_tenant = TenantId::new();
    let key = SessionKey::new(other_tenant, app.user_id, idea.id, role("ceo"));

    let err = app.resources.resolver.resolve(&key).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert_eq!(app.assistants.assistants_created(), 0);
}

#[tokio::test]
async fn test_thread_failure_deletes_new_persona_and_stores_nothing() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("ceo"));
    app.assistants.fail_threads.store(true, Ordering::SeqCst);

    let err = app.resources.resolver.resolve(&key).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert_eq!(app.assistants.assistants_created(), 1);
    assert_eq!(app.assistants.assistants_deleted(), 1);
    assert!(app.database().get_session(&key).await.unwrap().is_none());

    // Recovers once the backend does
    app.assistants.fail_threads.store(false, Ordering::SeqCst);
    let session = app.resources.resolver.resolve(&key).await.unwrap();
    assert_eq!(session.assistant_id, "asst_2");
}

#[tokio::test]
async fn test_concurrent_resolves_converge_on_one_session() {
    let assistants = Arc::new(FakeAssistantBackend::slow(Duration::from_millis(50)));
    let app = create_test_app_full(
        None,
        Arc::new(ScriptedProvider::replying("openai", "ok", None)),
        assistants,
    )
    .await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("ceo"));

    let resolver = app.resources.resolver.clone();
    let (a, b) = tokio::join!(resolver.resolve(&key), resolver.resolve(&key));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.assistant_id, b.assistant_id);
    assert_eq!(a.thread_id, b.thread_id);
    assert_eq!(app.assistants.assistants_created(), 2);
    assert_eq!(app.assistants.assistants_deleted(), 1);
    assert_eq!(app.assistants.threads_deleted(), 1);

    let stored = app.database().get_session(&key).await.unwrap().unwrap();
    assert_eq!(stored.assistant_id, a.assistant_id);
}

#[tokio::test]
async fn test_active_template_is_rendered_into_instructions() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    app.database()
        .upsert_template(
            &role("cmo"),
            "You market {{ idea_name }}. Pitch: {{idea_summary}}",
            true,
        )
        .await
        .unwrap();

    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("cmo"));
    app.resources.resolver.resolve(&key).await.unwrap();

    let spec = app.assistants.last_spec().unwrap();
    assert_eq!(
        spec.instructions,
        "You market Acme. Pitch: An AI team that vets ideas in minutes"
    );
}

#[tokio::test]
async fn test_inactive_or_broken_template_falls_back() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    app.database()
        .upsert_template(&role("cfo"), "You count {{ idea_name }}", false)
        .await
        .unwrap();
    app.database()
        .upsert_template(&role("coo"), "Run {{ unknown_field }}", true)
        .await
        .unwrap();

    for tag in ["cfo", "coo"] {
        let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role(tag));
        app.resources.resolver.resolve(&key).await.unwrap();
        let spec = app.assistants.last_spec().unwrap();
        assert!(
            spec.instructions.starts_with(&format!("You are the {} of a startup", tag.to_uppercase())),
            "unexpected instructions: {}",
            spec.instructions
        );
    }
}

#[tokio::test]
async fn test_start_new_thread_replaces_thread_only() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("ceo"));
    let original = app.resources.resolver.resolve(&key).await.unwrap();

    let updated = app.resources.resolver.start_new_thread(&key).await.unwrap();

    assert_eq!(updated.assistant_id, original.assistant_id);
    assert_ne!(updated.thread_id, original.thread_id);
    assert_eq!(app.assistants.assistants_created(), 1);
}

#[tokio::test]
async fn test_start_new_thread_discards_thread_when_session_disappears() {
    let assistants = Arc::new(FakeAssistantBackend::slow_threads(Duration::from_millis(100)));
    let app = create_test_app_full(
        None,
        Arc::new(ScriptedProvider::replying("openai", "ok", None)),
        assistants,
    )
    .await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("ceo"));
    app.resources.resolver.resolve(&key).await.unwrap();

    let resolver = app.resources.resolver.clone();
    let database = app.database().clone();
    let (swapped, deleted) = tokio::join!(resolver.start_new_thread(&key), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        database.delete_idea(app.tenant_id, app.user_id, idea.id).await
    });

    assert!(deleted.unwrap());
    let err = swapped.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert_eq!(app.assistants.threads_created(), 2);
    assert_eq!(app.assistants.threads_deleted(), 1);
    assert!(app.database().get_session(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_start_new_thread_without_session_is_not_found() {
    let app = create_test_app().await;
    let idea = app.seed_idea("Acme").await;
    let key = SessionKey::new(app.tenant_id, app.user_id, idea.id, role("ceo"));

    let err = app.resources.resolver.start_new_thread(&key).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert_eq!(app.assistants.threads_created(), 0);
}
