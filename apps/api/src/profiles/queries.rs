use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{Account, Profile, ProfileRole};

pub async fn find_account(pool: &PgPool, user_id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Absent profile is a normal state for freshly registered accounts.
pub async fn find_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Editable profile fields. `None` leaves the stored value untouched and an
/// empty string clears it.
#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub company_name: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub skills: Option<&'a str>,
    pub experience_years: Option<i32>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

/// Creates the profile with `role` if missing, otherwise applies `changes`.
/// The role of an existing profile is never changed.
pub async fn upsert_profile(
    pool: &PgPool,
    user_id: Uuid,
    role: ProfileRole,
    changes: &ProfileChanges<'_>,
) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles
            (user_id, role, company_name, industry, skills, experience_years, bio, location)
        VALUES ($1, $2, NULLIF($3, ''), NULLIF($4, ''), NULLIF($5, ''),
                COALESCE($6, 0), NULLIF($7, ''), NULLIF($8, ''))
        ON CONFLICT (user_id) DO UPDATE SET
            company_name     = NULLIF(COALESCE($3, profiles.company_name), ''),
            industry         = NULLIF(COALESCE($4, profiles.industry), ''),
            skills           = NULLIF(COALESCE($5, profiles.skills), ''),
            experience_years = COALESCE($6, profiles.experience_years),
            bio              = NULLIF(COALESCE($7, profiles.bio), ''),
            location         = NULLIF(COALESCE($8, profiles.location), ''),
            updated_at       = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(role.as_str())
    .bind(changes.company_name)
    .bind(changes.industry)
    .bind(changes.skills)
    .bind(changes.experience_years)
    .bind(changes.bio)
    .bind(changes.location)
    .fetch_one(pool)
    .await
}
