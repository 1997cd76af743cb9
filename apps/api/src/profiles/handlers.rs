use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::auth::{Capability, Viewer};
use crate::errors::AppError;
use crate::models::user::{Profile, ProfileRole};
use crate::profiles::queries::{upsert_profile, ProfileChanges};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    /// Only honoured when the profile does not exist yet.
    pub role: Option<ProfileRole>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub skills: Option<String>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl ProfileUpdateRequest {
    fn validate(&self) -> Result<(), AppError> {
        if matches!(self.experience_years, Some(years) if !(0..=80).contains(&years)) {
            return Err(AppError::Validation(
                "experience_years must be between 0 and 80".to_string(),
            ));
        }
        Ok(())
    }

    fn changes(&self) -> ProfileChanges<'_> {
        ProfileChanges {
            company_name: trimmed(&self.company_name),
            industry: trimmed(&self.industry),
            skills: trimmed(&self.skills),
            experience_years: self.experience_years,
            bio: trimmed(&self.bio),
            location: trimmed(&self.location),
        }
    }
}

/// Omitted fields stay `None`; a blank string is kept and clears the field.
fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim)
}

/// GET /api/v1/profile
pub async fn handle_get_profile(viewer: Viewer) -> Result<Json<Profile>, AppError> {
    viewer.require(Capability::ManageProfile)?;
    viewer
        .profile
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile has not been set up yet".to_string()))
}

/// PUT /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let account = viewer.require(Capability::ManageProfile)?;
    let Json(request) = payload?;
    request.validate()?;

    let role = viewer
        .profile
        .as_ref()
        .map(Profile::role)
        .or(request.role)
        .unwrap_or_default();

    let profile = upsert_profile(&state.db, account.id, role, &request.changes()).await?;
    tracing::info!("Profile updated for user {}", account.id);
    Ok(Json(profile))
}
