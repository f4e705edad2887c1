// ABOUTME: CRM route handlers for leads, contacts, their notes and follow-up tasks
// ABOUTME: Tenant scoped; unknown leads, contacts and tasks answer 404
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{authenticate, ApiJson};
use crate::database::{
    ContactNoteRecord, ContactRecord, LeadNoteRecord, LeadRecord, LeadTaskRecord, NewContact,
    NewContactNote, NewLead, NewLeadTask,
};
use crate::resources::ServerResources;
use founderhub_core::errors::AppError;

/// Request to add a note to a lead
#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    /// Note text
    pub content: String,
}

/// Response for listing leads
#[derive(Debug, Serialize, Deserialize)]
pub struct LeadListResponse {
    /// Leads, newest first
    pub leads: Vec<LeadRecord>,
    /// Total count
    pub total: usize,
}

/// Response for listing a lead's notes
#[derive(Debug, Serialize, Deserialize)]
pub struct NoteListResponse {
    /// Notes, oldest first
    pub notes: Vec<LeadNoteRecord>,
}

/// Response for listing a lead's tasks
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    /// Tasks, oldest first
    pub tasks: Vec<LeadTaskRecord>,
}

/// Response for listing contacts
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactListResponse {
    /// Contacts, newest first
    pub contacts: Vec<ContactRecord>,
    /// Total count
    pub total: usize,
}

/// Response for listing a contact's interaction notes
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactNoteListResponse {
    /// Notes, oldest first
    pub notes: Vec<ContactNoteRecord>,
}

/// CRM routes
pub struct CrmRoutes;

impl CrmRoutes {
    /// Create all CRM routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/crm/leads", post(Self::create_lead).get(Self::list_leads))
            .route("/api/crm/leads/:lead_id", get(Self::get_lead))
            .route(
                "/api/crm/leads/:lead_id/notes",
                post(Self::add_note).get(Self::list_notes),
            )
            .route(
                "/api/crm/leads/:lead_id/tasks",
                post(Self::add_task).get(Self::list_tasks),
            )
            .route("/api/crm/tasks/:task_id/complete", post(Self::complete_task))
            .route(
                "/api/crm/contacts",
                post(Self::create_contact).get(Self::list_contacts),
            )
            .route("/api/crm/contacts/:contact_id", get(Self::get_contact))
            .route(
                "/api/crm/contacts/:contact_id/notes",
                post(Self::add_contact_note).get(Self::list_contact_notes),
            )
            .with_state(resources)
    }

    async fn create_lead(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<NewLead>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let lead = resources
            .database
            .create_lead(auth.tenant_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(lead)).into_response())
    }

    async fn list_leads(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let leads = resources.database.list_leads(auth.tenant_id).await?;
        let total = leads.len();
        Ok((StatusCode::OK, Json(LeadListResponse { leads, total })).into_response())
    }

    async fn get_lead(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lead_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let lead = resources.database.get_lead(auth.tenant_id, &lead_id).await?;
        Ok((StatusCode::OK, Json(lead)).into_response())
    }

    async fn add_note(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lead_id): Path<String>,
        ApiJson(request): ApiJson<AddNoteRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let note = resources
            .database
            .add_lead_note(auth.tenant_id, &lead_id, &request.content)
            .await?;
        Ok((StatusCode::CREATED, Json(note)).into_response())
    }

    async fn list_notes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lead_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let notes = resources
            .database
            .list_lead_notes(auth.tenant_id, &lead_id)
            .await?;
        Ok((StatusCode::OK, Json(NoteListResponse { notes })).into_response())
    }

    async fn add_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lead_id): Path<String>,
        ApiJson(request): ApiJson<NewLeadTask>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let task = resources
            .database
            .add_lead_task(auth.tenant_id, &lead_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(task)).into_response())
    }

    async fn list_tasks(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lead_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let tasks = resources
            .database
            .list_lead_tasks(auth.tenant_id, &lead_id)
            .await?;
        Ok((StatusCode::OK, Json(TaskListResponse { tasks })).into_response())
    }

    async fn complete_task(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(task_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let task = resources
            .database
            .complete_lead_task(auth.tenant_id, &task_id)
            .await?;
        Ok((StatusCode::OK, Json(task)).into_response())
    }

    async fn create_contact(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<NewContact>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let contact = resources
            .database
            .create_contact(auth.tenant_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(contact)).into_response())
    }

    async fn list_contacts(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let contacts = resources.database.list_contacts(auth.tenant_id).await?;
        let total = contacts.len();
        Ok((StatusCode::OK, Json(ContactListResponse { contacts, total })).into_response())
    }

    async fn get_contact(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(contact_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let contact = resources
            .database
            .get_contact(auth.tenant_id, &contact_id)
            .await?;
        Ok((StatusCode::OK, Json(contact)).into_response())
    }

    async fn add_contact_note(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(contact_id): Path<String>,
        ApiJson(request): ApiJson<NewContactNote>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let note = resources
            .database
            .add_contact_note(auth.tenant_id, &contact_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(note)).into_response())
    }

    async fn list_contact_notes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(contact_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources)?;
        let notes = resources
            .database
            .list_contact_notes(auth.tenant_id, &contact_id)
            .await?;
        Ok((StatusCode::OK, Json(ContactNoteListResponse { notes })).into_response())
    }
}
