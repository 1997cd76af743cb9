//! Axum route handlers for job postings and applications.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{Capability, Viewer};
use crate::errors::AppError;
use crate::jobs::queries::{
    count_active_jobs, delete_job, find_job, has_applied, insert_application, insert_job,
    list_active_jobs, update_job, JobFields, NewApplication,
};
use crate::models::job::{Application, Job, JobType};
use crate::state::AppState;

pub const PAGE_SIZE: i64 = 10;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub page: u32,
    pub page_size: i64,
    pub total: i64,
    pub has_next: bool,
}

#[derive(Debug, Deserialize)]
pub struct JobInput {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub requirements: String,
    pub job_type: JobType,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<DateTime<Utc>>,
    /// Update only; new postings are always active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl JobInput {
    fn validate(&self) -> Result<JobFields<'_>, AppError> {
        let required = [
            ("title", &self.title),
            ("company", &self.company),
            ("description", &self.description),
            ("location", &self.location),
            ("requirements", &self.requirements),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{name} cannot be empty")));
            }
        }
        if self.title.chars().count() > 255 || self.company.chars().count() > 255 {
            return Err(AppError::Validation(
                "title and company must be at most 255 characters".to_string(),
            ));
        }

        Ok(JobFields {
            title: self.title.trim(),
            company: self.company.trim(),
            description: self.description.trim(),
            location: self.location.trim(),
            requirements: self.requirements.trim(),
            job_type: self.job_type,
            salary: self.salary.as_deref().map(str::trim).unwrap_or(""),
            application_deadline: self.application_deadline,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub full_name: String,
    pub email: String,
    pub portfolio: String,
    pub cover_letter: String,
}

impl ApplyRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.full_name.trim().is_empty() || self.cover_letter.trim().is_empty() {
            return Err(AppError::Validation(
                "full_name and cover_letter are required".to_string(),
            ));
        }
        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(AppError::Validation("email is not valid".to_string()));
        }
        let portfolio = self.portfolio.trim();
        if !(portfolio.starts_with("http://") || portfolio.starts_with("https://")) {
            return Err(AppError::Validation(
                "portfolio must be an http(s) URL".to_string(),
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    params: Result<Query<JobListQuery>, QueryRejection>,
) -> Result<Json<JobListResponse>, AppError> {
    let Query(params) = params?;
    let page = params.page.unwrap_or(1).max(1);
    let query = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let offset = i64::from(page - 1) * PAGE_SIZE;

    let jobs = list_active_jobs(&state.db, query, PAGE_SIZE, offset).await?;
    let total = count_active_jobs(&state.db, query).await?;

    Ok(Json(JobListResponse {
        has_next: offset + (jobs.len() as i64) < total,
        jobs,
        page,
        page_size: PAGE_SIZE,
        total,
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    find_job(&state.db, job_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    viewer: Viewer,
    payload: Result<Json<JobInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let account = viewer.require(Capability::ManageJobs)?;
    let Json(input) = payload?;
    let fields = input.validate()?;

    let job = insert_job(&state.db, account.id, &fields).await?;
    info!("Job {} posted by user {}", job.id, account.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(job_id): Path<Uuid>,
    payload: Result<Json<JobInput>, JsonRejection>,
) -> Result<Json<Job>, AppError> {
    let account = viewer.require(Capability::ManageJobs)?;
    let Json(input) = payload?;
    let fields = input.validate()?;

    let existing = owned_job(&state, job_id, account.id).await?;
    let is_active = input.is_active.unwrap_or(existing.is_active);

    let job = update_job(&state.db, job_id, &fields, is_active).await?;
    info!("Job {job_id} updated by user {}", account.id);
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let account = viewer.require(Capability::ManageJobs)?;
    owned_job(&state, job_id, account.id).await?;

    delete_job(&state.db, job_id).await?;
    info!("Job {job_id} deleted by user {}", account.id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(job_id): Path<Uuid>,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let account = viewer.require(Capability::ApplyToJobs)?;
    let Json(request) = payload?;
    request.validate()?;

    let job = find_job(&state.db, job_id)
        .await?
        .filter(|job| job.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if has_applied(&state.db, job.id, account.id).await? {
        return Err(AppError::Conflict(
            "You have already applied for this job.".to_string(),
        ));
    }

    let new = NewApplication {
        job_id: job.id,
        applicant_id: account.id,
        full_name: request.full_name.trim(),
        email: request.email.trim(),
        portfolio: request.portfolio.trim(),
        cover_letter: request.cover_letter.trim(),
    };

    let application = match insert_application(&state.db, &new).await {
        Ok(application) => application,
        // Lost a race against a concurrent submission.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(
                "You have already applied for this job.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!("User {} applied to job {}", account.id, job.id);
    Ok((StatusCode::CREATED, Json(application)))
}

/// Loads a job and checks the caller posted it.
async fn owned_job(state: &AppState, job_id: Uuid, user_id: Uuid) -> Result<Job, AppError> {
    let job = find_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    if job.posted_by != user_id {
        return Err(AppError::Forbidden(
            "You can only modify jobs you posted.".to_string(),
        ));
    }
    Ok(job)
}
