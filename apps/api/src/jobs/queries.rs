use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::job::{Application, Job, JobType};

/// Column values shared by create and update.
#[derive(Debug, Clone)]
pub struct JobFields<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub requirements: &'a str,
    pub job_type: JobType,
    pub salary: &'a str,
    pub application_deadline: Option<DateTime<Utc>>,
}

/// Builds an ILIKE pattern matching `query` literally anywhere in the column.
pub fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Active jobs, newest first, optionally filtered on title, company or location.
pub async fn list_active_jobs(
    pool: &PgPool,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Job>, sqlx::Error> {
    let pattern = query.map(like_pattern);
    sqlx::query_as::<_, Job>(
        r#"
        SELECT * FROM jobs
        WHERE is_active
          AND ($1::text IS NULL
               OR title ILIKE $1 OR company ILIKE $1 OR location ILIKE $1)
        ORDER BY date_posted DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_active_jobs(pool: &PgPool, query: Option<&str>) -> Result<i64, sqlx::Error> {
    let pattern = query.map(like_pattern);
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM jobs
        WHERE is_active
          AND ($1::text IS NULL
               OR title ILIKE $1 OR company ILIKE $1 OR location ILIKE $1)
        "#,
    )
    .bind(pattern)
    .fetch_one(pool)
    .await
}

pub async fn recent_active_jobs(pool: &PgPool, limit: i64) -> Result<Vec<Job>, sqlx::Error> {
    list_active_jobs(pool, None, limit, 0).await
}

/// Active jobs where any of `patterns` matches the title, description,
/// requirements, company or location, newest first. An empty pattern list
/// matches every active job. Jobs already applied to by `exclude_applicant`
/// are skipped.
pub async fn search_active_jobs(
    pool: &PgPool,
    patterns: &[String],
    exclude_applicant: Option<Uuid>,
    limit: i64,
) -> Result<Vec<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>(
        r#"
        SELECT j.* FROM jobs j
        WHERE j.is_active
          AND (cardinality($1::text[]) = 0
               OR j.title ILIKE ANY($1) OR j.description ILIKE ANY($1)
               OR j.requirements ILIKE ANY($1) OR j.company ILIKE ANY($1)
               OR j.location ILIKE ANY($1))
          AND ($2::uuid IS NULL OR NOT EXISTS (
                SELECT 1 FROM applications a
                WHERE a.job_id = j.id AND a.applicant_id = $2))
        ORDER BY j.date_posted DESC
        LIMIT $3
        "#,
    )
    .bind(patterns)
    .bind(exclude_applicant)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn find_job(pool: &PgPool, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_job(
    pool: &PgPool,
    posted_by: Uuid,
    fields: &JobFields<'_>,
) -> Result<Job, sqlx::Error> {
    sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs
            (id, title, company, description, location, requirements,
             job_type, posted_by, salary, application_deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(fields.title)
    .bind(fields.company)
    .bind(fields.description)
    .bind(fields.location)
    .bind(fields.requirements)
    .bind(fields.job_type.code())
    .bind(posted_by)
    .bind(fields.salary)
    .bind(fields.application_deadline)
    .fetch_one(pool)
    .await
}

pub async fn update_job(
    pool: &PgPool,
    job_id: Uuid,
    fields: &JobFields<'_>,
    is_active: bool,
) -> Result<Job, sqlx::Error> {
    sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs SET
            title = $2, company = $3, description = $4, location = $5,
            requirements = $6, job_type = $7, salary = $8,
            application_deadline = $9, is_active = $10
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(job_id)
    .bind(fields.title)
    .bind(fields.company)
    .bind(fields.description)
    .bind(fields.location)
    .bind(fields.requirements)
    .bind(fields.job_type.code())
    .bind(fields.salary)
    .bind(fields.application_deadline)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

/// Hard delete; applications cascade.
pub async fn delete_job(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_active_jobs_posted_by(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE posted_by = $1 AND is_active")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn count_applications_by(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE applicant_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn has_applied(pool: &PgPool, job_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1 AND applicant_id = $2)",
    )
    .bind(job_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub struct NewApplication<'a> {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub full_name: &'a str,
    pub email: &'a str,
    pub portfolio: &'a str,
    pub cover_letter: &'a str,
}

pub async fn insert_application(
    pool: &PgPool,
    new: &NewApplication<'_>,
) -> Result<Application, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications
            (id, job_id, applicant_id, full_name, email, portfolio, cover_letter)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.job_id)
    .bind(new.applicant_id)
    .bind(new.full_name)
    .bind(new.email)
    .bind(new.portfolio)
    .bind(new.cover_letter)
    .fetch_one(pool)
    .await
}
