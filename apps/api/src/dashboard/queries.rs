use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::job::Job;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompanyTotals {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub total_applications: i64,
    pub recent_applications: i64,
}

/// A posted job together with how many applications it received.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobWithApplications {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub application_count: i64,
}

/// An application joined with the job it targets.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub applicant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub date_applied: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PlatformStats {
    pub total_jobs: i64,
    pub total_companies: i64,
    pub total_applicants: i64,
    pub total_applications: i64,
}

/// `since` bounds the "recent applications" counter.
pub async fn company_totals(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<CompanyTotals, sqlx::Error> {
    sqlx::query_as::<_, CompanyTotals>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM jobs WHERE posted_by = $1) AS total_jobs,
            (SELECT COUNT(*) FROM jobs WHERE posted_by = $1 AND is_active) AS active_jobs,
            (SELECT COUNT(*) FROM applications a JOIN jobs j ON j.id = a.job_id
              WHERE j.posted_by = $1) AS total_applications,
            (SELECT COUNT(*) FROM applications a JOIN jobs j ON j.id = a.job_id
              WHERE j.posted_by = $1 AND a.date_applied >= $2) AS recent_applications
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await
}

pub async fn recent_posted_jobs(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>(
        "SELECT * FROM jobs WHERE posted_by = $1 ORDER BY date_posted DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn popular_posted_jobs(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<JobWithApplications>, sqlx::Error> {
    sqlx::query_as::<_, JobWithApplications>(
        r#"
        SELECT j.*, COUNT(a.id) AS application_count
        FROM jobs j
        LEFT JOIN applications a ON a.job_id = j.id
        WHERE j.posted_by = $1
        GROUP BY j.id
        ORDER BY application_count DESC, j.date_posted DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

const APPLICATION_SUMMARY_SELECT: &str = r#"
    SELECT a.id, a.job_id, j.title AS job_title, j.company, a.applicant_id,
           a.full_name, a.email, a.date_applied
    FROM applications a
    JOIN jobs j ON j.id = a.job_id
"#;

/// Applications received on jobs posted by `user_id`, newest first.
pub async fn applications_received(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationSummary>(&format!(
        "{APPLICATION_SUMMARY_SELECT} WHERE j.posted_by = $1 ORDER BY a.date_applied DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Applications submitted by `user_id`, newest first.
pub async fn applications_submitted(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationSummary>(&format!(
        "{APPLICATION_SUMMARY_SELECT} WHERE a.applicant_id = $1 ORDER BY a.date_applied DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count_applications_since(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE applicant_id = $1 AND date_applied >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await
}

pub async fn platform_stats(pool: &PgPool) -> Result<PlatformStats, sqlx::Error> {
    sqlx::query_as::<_, PlatformStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM jobs WHERE is_active) AS total_jobs,
            (SELECT COUNT(*) FROM profiles WHERE role = 'company') AS total_companies,
            (SELECT COUNT(*) FROM profiles WHERE role = 'applicant') AS total_applicants,
            (SELECT COUNT(*) FROM applications) AS total_applications
        "#,
    )
    .fetch_one(pool)
    .await
}
