// ABOUTME: Integration tests for the durable job scheduler and its webhook handler
// ABOUTME: Uses wiremock as the webhook target and drives polls with explicit clocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{create_test_app, create_test_app_with_jobs, create_test_database, test_config};
use founderhub::database::{Database, JobStatus};
use founderhub::errors::ErrorCode;
use founderhub::models::TenantId;
use founderhub::scheduler::{JobHandler, JobScheduler, PollSummary, RetryPolicy, WebhookJobHandler};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use tokio::sync::watch;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn scheduler() -> (Arc<Database>, JobScheduler) {
    let database = Arc::new(create_test_database().await);
    let scheduler = JobScheduler::new(database.clone(), test_config().scheduler)
        .with_handler(Arc::new(WebhookJobHandler::new().unwrap()));
    (database, scheduler)
}

fn webhook(server: &MockServer) -> Value {
    json!({ "url": format!("{}/hook", server.uri()), "body": { "event": "ping" } })
}

fn soon() -> chrono::DateTime<Utc> {
    Utc::now() + chrono::Duration::milliseconds(200)
}

// ============================================================================
// Scheduling
// ============================================================================

#[tokio::test]
async fn test_schedule_rejects_past_run_at() {
    let (_, scheduler) = scheduler().await;
    let server = MockServer::start().await;

    let err = scheduler
        .schedule(
            TenantId::new(),
            "webhook",
            webhook(&server),
            Utc::now() - chrono::Duration::seconds(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_schedule_rejects_unknown_kind() {
    let (_, scheduler) = scheduler().await;

    let err = scheduler
        .schedule(TenantId::new(), "fax", json!({}), soon())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert!(err.message.contains("fax"));
}

#[tokio::test]
async fn test_schedule_rejects_non_http_webhook_url() {
    let (_, scheduler) = scheduler().await;

    let err = scheduler
        .schedule(
            TenantId::new(),
            "webhook",
            json!({ "url": "ftp://example.com/hook" }),
            soon(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_scheduled_job_is_pending_with_configured_attempts() {
    let (_, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    let tenant_id = TenantId::new();

    let job = scheduler
        .schedule(tenant_id, "webhook", webhook(&server), soon())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.attempts, 0);
    assert_eq!(job.max_attempts, 3);

    let listed = scheduler.list(tenant_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(scheduler.list(TenantId::new()).await.unwrap().is_empty());
}

// ============================================================================
// Polling
// ============================================================================

#[tokio::test]
async fn test_due_job_is_delivered_and_completed() {
    let (database, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(json!({ "event": "ping" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let job = scheduler
        .schedule(TenantId::new(), "webhook", webhook(&server), soon())
        .await
        .unwrap();

    // Not due yet
    let early = scheduler.run_due_once(Utc::now()).await.unwrap();
    assert_eq!(early, PollSummary::default());

    let summary = scheduler
        .run_due_once(Utc::now() + chrono::Duration::seconds(5))
        .await
        .unwrap();
    assert_eq!(summary.completed, 1);

    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.attempts, 1);
}

#[tokio::test]
async fn test_failing_job_backs_off_then_fails_permanently() {
    let (database, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let job = scheduler
        .schedule(TenantId::new(), "webhook", webhook(&server), soon())
        .await
        .unwrap();
    // Whole seconds, as stored timestamps keep millisecond precision
    let t0 = Utc.timestamp_opt(Utc::now().timestamp() + 5, 0).unwrap();

    let first = scheduler.run_due_once(t0).await.unwrap();
    assert_eq!(first.retried, 1);
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(stored.run_at, t0 + chrono::Duration::seconds(2));
    assert!(stored.last_error.unwrap().contains("500"));

    // Before the backoff elapses nothing runs
    let waiting = scheduler.run_due_once(t0 + chrono::Duration::seconds(1)).await.unwrap();
    assert_eq!(waiting, PollSummary::default());

    let t1 = t0 + chrono::Duration::seconds(10);
    let second = scheduler.run_due_once(t1).await.unwrap();
    assert_eq!(second.retried, 1);
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.run_at, t1 + chrono::Duration::seconds(4));

    let third = scheduler
        .run_due_once(t0 + chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(third.failed, 1);
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.attempts, 3);
}

#[tokio::test]
async fn test_custom_retry_policy_sets_next_run() {
    let (database, scheduler) = scheduler().await;
    let scheduler = scheduler.with_retry_policy(RetryPolicy {
        base: Duration::from_secs(30),
        factor: 3,
        cap: Duration::from_secs(60),
    });
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let job = scheduler
        .schedule(TenantId::new(), "webhook", webhook(&server), soon())
        .await
        .unwrap();
    let t0 = Utc.timestamp_opt(Utc::now().timestamp() + 5, 0).unwrap();

    scheduler.run_due_once(t0).await.unwrap();
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.run_at, t0 + chrono::Duration::seconds(30));

    let t1 = t0 + chrono::Duration::seconds(30);
    scheduler.run_due_once(t1).await.unwrap();
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.run_at, t1 + chrono::Duration::seconds(60));
}

#[tokio::test]
async fn test_job_without_handler_fails_immediately() {
    let (database, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    let job = scheduler
        .schedule(TenantId::new(), "webhook", webhook(&server), soon())
        .await
        .unwrap();

    // A scheduler started without the webhook handler
    let bare = JobScheduler::new(database.clone(), test_config().scheduler);
    let summary = bare
        .run_due_once(Utc::now() + chrono::Duration::seconds(5))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.last_error.unwrap().contains("webhook"));
}

#[tokio::test]
async fn test_cancelled_job_never_runs() {
    let (database, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let tenant_id = TenantId::new();
    let job = scheduler
        .schedule(tenant_id, "webhook", webhook(&server), soon())
        .await
        .unwrap();

    // Another tenant cannot cancel it
    let err = scheduler.cancel(TenantId::new(), job.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    scheduler.cancel(tenant_id, job.id).await.unwrap();
    let summary = scheduler
        .run_due_once(Utc::now() + chrono::Duration::seconds(5))
        .await
        .unwrap();

    assert_eq!(summary, PollSummary::default());
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);

    // Only pending jobs can be cancelled
    let again = scheduler.cancel(tenant_id, job.id).await.unwrap_err();
    assert_eq!(again.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_interrupted_jobs_are_requeued() {
    let (database, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    let job = scheduler
        .schedule(TenantId::new(), "webhook", webhook(&server), soon())
        .await
        .unwrap();

    let claimed = database
        .claim_due_jobs(Utc::now() + chrono::Duration::seconds(5), 10)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].status, JobStatus::Running);

    // A second claimer finds nothing
    let again = database
        .claim_due_jobs(Utc::now() + chrono::Duration::seconds(5), 10)
        .await
        .unwrap();
    assert!(again.is_empty());

    let requeued = database.requeue_interrupted_jobs().await.unwrap();
    assert_eq!(requeued, 1);
    let stored = database.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
}

#[tokio::test]
async fn test_worker_delivers_due_job_and_stops_on_shutdown() {
    let (database, scheduler) = scheduler().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let job = scheduler
        .schedule(TenantId::new(), "webhook", webhook(&server), soon())
        .await
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(Arc::new(scheduler).run_worker(shutdown_rx));

    let mut status = JobStatus::Pending;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        status = database.get_job(job.id).await.unwrap().unwrap().status;
        if status == JobStatus::Completed {
            break;
        }
    }
    assert_eq!(status, JobStatus::Completed);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

// ============================================================================
// HTTP routes
// ============================================================================

#[tokio::test]
async fn test_schedule_list_and_cancel_over_http() {
    let handlers: Vec<Arc<dyn JobHandler>> = vec![Arc::new(WebhookJobHandler::new().unwrap())];
    let app = create_test_app_with_jobs(handlers).await;
    let server = MockServer::start().await;
    let run_at = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();

    let created = AxumTestRequest::post("/api/scheduler/jobs")
        .bearer(&app.token)
        .json(&json!({ "kind": "webhook", "payload": webhook(&server), "run_at": run_at }))
        .send(app.router())
        .await;
    assert_eq!(created.status(), 201);
    let job: Value = created.json();
    assert_eq!(job["status"], "pending");
    let job_id = job["id"].as_str().unwrap();

    let listed = AxumTestRequest::get("/api/scheduler/jobs")
        .bearer(&app.token)
        .send(app.router())
        .await;
    let body: Value = listed.json();
    assert_eq!(body["total"], 1);

    let cancelled = AxumTestRequest::delete(&format!("/api/scheduler/jobs/{job_id}"))
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(cancelled.status(), 204);

    let again = AxumTestRequest::delete(&format!("/api/scheduler/jobs/{job_id}"))
        .bearer(&app.token)
        .send(app.router())
        .await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_unregistered_kind_is_rejected_over_http() {
    let app = create_test_app().await;

    let response = AxumTestRequest::post("/api/scheduler/jobs")
        .bearer(&app.token)
        .json(&json!({
            "kind": "webhook",
            "payload": { "url": "https://example.com/hook" },
            "run_at": (Utc::now() + chrono::Duration::hours(1)).to_rfc3339()
        }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_cancel_with_malformed_id_is_bad_request() {
    let app = create_test_app().await;

    let response = AxumTestRequest::delete(&format!("/api/scheduler/jobs/{}x", Uuid::new_v4()))
        .bearer(&app.token)
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
}
