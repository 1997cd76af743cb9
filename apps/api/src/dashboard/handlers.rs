use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::{Capability, Viewer};
use crate::dashboard::queries::{
    applications_received, applications_submitted, company_totals, count_applications_since,
    platform_stats, popular_posted_jobs, recent_posted_jobs, ApplicationSummary, JobWithApplications,
    PlatformStats,
};
use crate::errors::AppError;
use crate::jobs::queries::count_applications_by;
use crate::models::job::Job;
use crate::state::AppState;

const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct CompanyDashboard {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub inactive_jobs: i64,
    pub total_applications: i64,
    pub recent_applications_count: i64,
    pub recent_jobs: Vec<Job>,
    pub recent_applications: Vec<ApplicationSummary>,
    pub popular_jobs: Vec<JobWithApplications>,
}

#[derive(Debug, Serialize)]
pub struct ApplicantDashboard {
    pub total_applications: i64,
    pub recent_applications_count: i64,
    pub recent_applications: Vec<ApplicationSummary>,
}

/// GET /api/v1/dashboard/company
pub async fn handle_company_dashboard(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<CompanyDashboard>, AppError> {
    let account = viewer.require(Capability::ManageJobs)?;
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);

    let totals = company_totals(&state.db, account.id, since).await?;
    let recent_jobs = recent_posted_jobs(&state.db, account.id, 5).await?;
    let recent_applications = applications_received(&state.db, account.id, 10).await?;
    let popular_jobs = popular_posted_jobs(&state.db, account.id, 5).await?;

    Ok(Json(CompanyDashboard {
        total_jobs: totals.total_jobs,
        active_jobs: totals.active_jobs,
        inactive_jobs: totals.total_jobs - totals.active_jobs,
        total_applications: totals.total_applications,
        recent_applications_count: totals.recent_applications,
        recent_jobs,
        recent_applications,
        popular_jobs,
    }))
}

/// GET /api/v1/dashboard/applicant
pub async fn handle_applicant_dashboard(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<ApplicantDashboard>, AppError> {
    let account = viewer.require(Capability::ApplyToJobs)?;
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);

    Ok(Json(ApplicantDashboard {
        total_applications: count_applications_by(&state.db, account.id).await?,
        recent_applications_count: count_applications_since(&state.db, account.id, since).await?,
        recent_applications: applications_submitted(&state.db, account.id, 5).await?,
    }))
}

/// GET /api/v1/stats
pub async fn handle_platform_stats(
    State(state): State<AppState>,
) -> Result<Json<PlatformStats>, AppError> {
    Ok(Json(platform_stats(&state.db).await?))
}
