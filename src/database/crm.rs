// ABOUTME: Database operations for CRM leads, contacts, their notes and follow-up tasks
// ABOUTME: All records are tenant scoped; tasks can be marked complete exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use anyhow::Result;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{timestamp_now, Database};

/// Stage assigned to leads created without one
const DEFAULT_LEAD_STAGE: &str = "New";

/// Fields supplied when creating a lead
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    /// Contact name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Company name
    #[serde(default)]
    pub company: Option<String>,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Pipeline stage, defaults to `New`
    #[serde(default)]
    pub stage: Option<String>,
    /// Lead score
    #[serde(default)]
    pub score: Option<i64>,
    /// Assigned sales rep
    #[serde(default)]
    pub rep: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLead {
    /// Reject blank names and malformed emails
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first problem
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        check_email(&self.email)?;
        if self.score.is_some_and(|s| !(0..=100).contains(&s)) {
            return Err(AppError::invalid_input("Lead score must be between 0 and 100"));
        }
        Ok(())
    }
}

fn check_email(raw: &str) -> AppResult<()> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(AppError::missing_field("email"));
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::invalid_input(format!("Invalid email address: {email}")));
    }
    Ok(())
}

/// Stored CRM lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Lead ID
    pub id: String,
    /// Contact name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Company name
    pub company: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Pipeline stage
    pub stage: String,
    /// Lead score
    pub score: Option<i64>,
    /// Assigned sales rep
    pub rep: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Notes
    pub notes: Option<String>,
    /// Creation time (ISO 8601)
    pub created_at: String,
}

/// Note attached to a lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadNoteRecord {
    /// Note ID
    pub id: String,
    /// Lead the note belongs to
    pub lead_id: String,
    /// Note text
    pub content: String,
    /// Creation time (ISO 8601)
    pub created_at: String,
}

/// Fields supplied when creating a task
#[derive(Debug, Clone, Deserialize)]
pub struct NewLeadTask {
    /// Task title
    pub title: String,
    /// Due date (free-form, usually ISO 8601)
    #[serde(default)]
    pub due_date: Option<String>,
    /// Extra notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Assignee
    #[serde(default)]
    pub assigned_to: Option<String>,
}

/// Follow-up task attached to a lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadTaskRecord {
    /// Task ID
    pub id: String,
    /// Lead the task belongs to
    pub lead_id: String,
    /// Task title
    pub title: String,
    /// Due date
    pub due_date: Option<String>,
    /// Extra notes
    pub notes: Option<String>,
    /// Assignee
    pub assigned_to: Option<String>,
    /// Completion flag
    pub completed: bool,
    /// Completion time (ISO 8601)
    pub completed_at: Option<String>,
    /// Creation time (ISO 8601)
    pub created_at: String,
}

/// Fields supplied when creating a contact
#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Relationship to the startup, e.g. `Advisor` or `Potential User`
    #[serde(default)]
    pub role: Option<String>,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// `LinkedIn` profile URL
    #[serde(default)]
    pub linkedin: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Stored CRM contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Contact ID
    pub id: String,
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Relationship to the startup
    pub role: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// `LinkedIn` profile URL
    pub linkedin: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Creation time (ISO 8601)
    pub created_at: String,
}

/// Fields supplied when logging an interaction with a contact
#[derive(Debug, Clone, Deserialize)]
pub struct NewContactNote {
    /// Note text
    pub note: String,
    /// Where the interaction happened: email, linkedin, call
    #[serde(default)]
    pub channel: Option<String>,
}

/// Interaction logged against a contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactNoteRecord {
    /// Note ID
    pub id: String,
    /// Contact the note belongs to
    pub contact_id: String,
    /// Note text
    pub note: String,
    /// Interaction channel
    pub channel: Option<String>,
    /// Creation time (ISO 8601)
    pub created_at: String,
}

const LEAD_COLUMNS: &str =
    "id, name, email, company, phone, stage, score, rep, tags, notes, created_at";
const TASK_COLUMNS: &str =
    "id, lead_id, title, due_date, notes, assigned_to, completed, completed_at, created_at";

fn lead_from_row(r: &SqliteRow) -> AppResult<LeadRecord> {
    let tags: String = r.try_get("tags")?;
    Ok(LeadRecord {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        email: r.try_get("email")?,
        company: r.try_get("company")?,
        phone: r.try_get("phone")?,
        stage: r.try_get("stage")?,
        score: r.try_get("score")?,
        rep: r.try_get("rep")?,
        tags: serde_json::from_str(&tags)?,
        notes: r.try_get("notes")?,
        created_at: r.try_get("created_at")?,
    })
}

const CONTACT_COLUMNS: &str = "id, name, email, role, phone, linkedin, tags, created_at";

fn contact_from_row(r: &SqliteRow) -> AppResult<ContactRecord> {
    let tags: String = r.try_get("tags")?;
    Ok(ContactRecord {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        email: r.try_get("email")?,
        role: r.try_get("role")?,
        phone: r.try_get("phone")?,
        linkedin: r.try_get("linkedin")?,
        tags: serde_json::from_str(&tags)?,
        created_at: r.try_get("created_at")?,
    })
}

fn task_from_row(r: &SqliteRow) -> AppResult<LeadTaskRecord> {
    Ok(LeadTaskRecord {
        id: r.try_get("id")?,
        lead_id: r.try_get("lead_id")?,
        title: r.try_get("title")?,
        due_date: r.try_get("due_date")?,
        notes: r.try_get("notes")?,
        assigned_to: r.try_get("assigned_to")?,
        completed: r.try_get("completed")?,
        completed_at: r.try_get("completed_at")?,
        created_at: r.try_get("created_at")?,
    })
}

impl Database {
    pub(super) async fn migrate_crm(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS crm_leads (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                company TEXT,
                phone TEXT,
                stage TEXT NOT NULL,
                score INTEGER,
                rep TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                notes TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS crm_lead_notes (
                id TEXT PRIMARY KEY,
                lead_id TEXT NOT NULL REFERENCES crm_leads(id) ON DELETE CASCADE,
                tenant_id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS crm_lead_tasks (
                id TEXT PRIMARY KEY,
                lead_id TEXT NOT NULL REFERENCES crm_leads(id) ON DELETE CASCADE,
                tenant_id TEXT NOT NULL,
                title TEXT NOT NULL,
                due_date TEXT,
                notes TEXT,
                assigned_to TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS crm_contacts (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                role TEXT,
                phone TEXT,
                linkedin TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS crm_contact_notes (
                id TEXT PRIMARY KEY,
                contact_id TEXT NOT NULL REFERENCES crm_contacts(id) ON DELETE CASCADE,
                tenant_id TEXT NOT NULL,
                note TEXT NOT NULL,
                channel TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_crm_leads_tenant ON crm_leads(tenant_id, created_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_crm_contacts_tenant ON crm_contacts(tenant_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a lead
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the insert fails
    pub async fn create_lead(&self, tenant_id: TenantId, lead: &NewLead) -> AppResult<LeadRecord> {
        lead.validate()?;
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();
        let stage = lead
            .stage
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LEAD_STAGE);
        let tags = serde_json::to_string(&lead.tags)?;

        sqlx::query(
            r"
            INSERT INTO crm_leads (id, tenant_id, name, email, company, phone, stage, score, rep, tags, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(&id)
        .bind(tenant_id.to_string())
        .bind(lead.name.trim())
        .bind(lead.email.trim())
        .bind(lead.company.as_deref())
        .bind(lead.phone.as_deref())
        .bind(stage)
        .bind(lead.score)
        .bind(lead.rep.as_deref())
        .bind(&tags)
        .bind(lead.notes.as_deref())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create lead: {e}")))?;

        Ok(LeadRecord {
            id,
            name: lead.name.trim().to_owned(),
            email: lead.email.trim().to_owned(),
            company: lead.company.clone(),
            phone: lead.phone.clone(),
            stage: stage.to_owned(),
            score: lead.score,
            rep: lead.rep.clone(),
            tags: lead.tags.clone(),
            notes: lead.notes.clone(),
            created_at: now,
        })
    }

    /// List a tenant's leads, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_leads(&self, tenant_id: TenantId) -> AppResult<Vec<LeadRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM crm_leads WHERE tenant_id = $1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list leads: {e}")))?;

        rows.iter().map(lead_from_row).collect()
    }

    /// Get a lead, failing with `NotFound` outside the tenant
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the lead is not visible to the tenant
    pub async fn get_lead(&self, tenant_id: TenantId, lead_id: &str) -> AppResult<LeadRecord> {
        let row = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM crm_leads WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(lead_id)
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get lead: {e}")))?;

        row.as_ref()
            .map(lead_from_row)
            .transpose()?
            .ok_or_else(|| AppError::not_found(format!("Lead {lead_id}")))
    }

    /// Attach a note to a lead
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown leads or a database error
    pub async fn add_lead_note(
        &self,
        tenant_id: TenantId,
        lead_id: &str,
        content: &str,
    ) -> AppResult<LeadNoteRecord> {
        if content.trim().is_empty() {
            return Err(AppError::missing_field("content"));
        }
        self.get_lead(tenant_id, lead_id).await?;
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            "INSERT INTO crm_lead_notes (id, lead_id, tenant_id, content, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(lead_id)
        .bind(tenant_id.to_string())
        .bind(content.trim())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add lead note: {e}")))?;

        Ok(LeadNoteRecord {
            id,
            lead_id: lead_id.to_owned(),
            content: content.trim().to_owned(),
            created_at: now,
        })
    }

    /// Notes of a lead, oldest first
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown leads or a database error
    pub async fn list_lead_notes(
        &self,
        tenant_id: TenantId,
        lead_id: &str,
    ) -> AppResult<Vec<LeadNoteRecord>> {
        self.get_lead(tenant_id, lead_id).await?;
        let rows = sqlx::query(
            r"
            SELECT id, lead_id, content, created_at FROM crm_lead_notes
            WHERE lead_id = $1 AND tenant_id = $2 ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(lead_id)
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list lead notes: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(LeadNoteRecord {
                    id: r.try_get("id")?,
                    lead_id: r.try_get("lead_id")?,
                    content: r.try_get("content")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Create a follow-up task for a lead
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown leads, a validation error, or a database error
    pub async fn add_lead_task(
        &self,
        tenant_id: TenantId,
        lead_id: &str,
        task: &NewLeadTask,
    ) -> AppResult<LeadTaskRecord> {
        if task.title.trim().is_empty() {
            return Err(AppError::missing_field("title"));
        }
        self.get_lead(tenant_id, lead_id).await?;
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r"
            INSERT INTO crm_lead_tasks (id, lead_id, tenant_id, title, due_date, notes, assigned_to, completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
            ",
        )
        .bind(&id)
        .bind(lead_id)
        .bind(tenant_id.to_string())
        .bind(task.title.trim())
        .bind(task.due_date.as_deref())
        .bind(task.notes.as_deref())
        .bind(task.assigned_to.as_deref())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add lead task: {e}")))?;

        Ok(LeadTaskRecord {
            id,
            lead_id: lead_id.to_owned(),
            title: task.title.trim().to_owned(),
            due_date: task.due_date.clone(),
            notes: task.notes.clone(),
            assigned_to: task.assigned_to.clone(),
            completed: false,
            completed_at: None,
            created_at: now,
        })
    }

    /// Tasks of a lead, oldest first
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown leads or a database error
    pub async fn list_lead_tasks(
        &self,
        tenant_id: TenantId,
        lead_id: &str,
    ) -> AppResult<Vec<LeadTaskRecord>> {
        self.get_lead(tenant_id, lead_id).await?;
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM crm_lead_tasks WHERE lead_id = $1 AND tenant_id = $2 \
             ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(lead_id)
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list lead tasks: {e}")))?;

        rows.iter().map(task_from_row).collect()
    }

    /// Mark a task complete; completing twice keeps the first completion time
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the task is not visible to the tenant
    pub async fn complete_lead_task(
        &self,
        tenant_id: TenantId,
        task_id: &str,
    ) -> AppResult<LeadTaskRecord> {
        sqlx::query(
            r"
            UPDATE crm_lead_tasks
            SET completed = 1, completed_at = COALESCE(completed_at, $1)
            WHERE id = $2 AND tenant_id = $3
            ",
        )
        .bind(timestamp_now())
        .bind(task_id)
        .bind(tenant_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete lead task: {e}")))?;

        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM crm_lead_tasks WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(task_id)
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get lead task: {e}")))?;

        row.as_ref()
            .map(task_from_row)
            .transpose()?
            .ok_or_else(|| AppError::not_found(format!("Task {task_id}")))
    }

    /// Create a contact
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the insert fails
    pub async fn create_contact(
        &self,
        tenant_id: TenantId,
        contact: &NewContact,
    ) -> AppResult<ContactRecord> {
        if contact.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        check_email(&contact.email)?;
        let record = ContactRecord {
            id: Uuid::new_v4().to_string(),
            name: contact.name.trim().to_owned(),
            email: contact.email.trim().to_owned(),
            role: contact.role.clone(),
            phone: contact.phone.clone(),
            linkedin: contact.linkedin.clone(),
            tags: contact.tags.clone(),
            created_at: timestamp_now(),
        };

        sqlx::query(
            r"
            INSERT INTO crm_contacts (id, tenant_id, name, email, role, phone, linkedin, tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&record.id)
        .bind(tenant_id.to_string())
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.role.as_deref())
        .bind(record.phone.as_deref())
        .bind(record.linkedin.as_deref())
        .bind(serde_json::to_string(&record.tags)?)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create contact: {e}")))?;

        Ok(record)
    }

    /// Contacts of a tenant, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_contacts(&self, tenant_id: TenantId) -> AppResult<Vec<ContactRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM crm_contacts WHERE tenant_id = $1 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list contacts: {e}")))?;

        rows.iter().map(contact_from_row).collect()
    }

    /// Get a contact, failing with `NotFound` outside the tenant
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the contact is not visible to the tenant
    pub async fn get_contact(
        &self,
        tenant_id: TenantId,
        contact_id: &str,
    ) -> AppResult<ContactRecord> {
        let row = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM crm_contacts WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(contact_id)
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get contact: {e}")))?;

        row.as_ref()
            .map(contact_from_row)
            .transpose()?
            .ok_or_else(|| AppError::not_found(format!("Contact {contact_id}")))
    }

    /// Log an interaction with a contact
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown contacts, a validation error for a
    /// blank note, or a database error
    pub async fn add_contact_note(
        &self,
        tenant_id: TenantId,
        contact_id: &str,
        note: &NewContactNote,
    ) -> AppResult<ContactNoteRecord> {
        if note.note.trim().is_empty() {
            return Err(AppError::missing_field("note"));
        }
        self.get_contact(tenant_id, contact_id).await?;
        let record = ContactNoteRecord {
            id: Uuid::new_v4().to_string(),
            contact_id: contact_id.to_owned(),
            note: note.note.trim().to_owned(),
            channel: note
                .channel
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_lowercase),
            created_at: timestamp_now(),
        };

        sqlx::query(
            r"
            INSERT INTO crm_contact_notes (id, contact_id, tenant_id, note, channel, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&record.id)
        .bind(contact_id)
        .bind(tenant_id.to_string())
        .bind(&record.note)
        .bind(record.channel.as_deref())
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add contact note: {e}")))?;

        Ok(record)
    }

    /// Interactions with a contact, oldest first
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown contacts or a database error
    pub async fn list_contact_notes(
        &self,
        tenant_id: TenantId,
        contact_id: &str,
    ) -> AppResult<Vec<ContactNoteRecord>> {
        self.get_contact(tenant_id, contact_id).await?;
        let rows = sqlx::query(
            r"
            SELECT id, contact_id, note, channel, created_at FROM crm_contact_notes
            WHERE contact_id = $1 AND tenant_id = $2 ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(contact_id)
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list contact notes: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(ContactNoteRecord {
                    id: r.try_get("id")?,
                    contact_id: r.try_get("contact_id")?,
                    note: r.try_get("note")?,
                    channel: r.try_get("channel")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }
}
