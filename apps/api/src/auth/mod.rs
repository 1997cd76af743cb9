//! Request identity and role-based capability checks.
//!
//! Authentication itself happens upstream: a trusted proxy asserts the caller
//! through the `x-user-id` header. This module resolves that id into a
//! [`Viewer`] once per request and answers capability questions against it.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Account, Profile, ProfileRole};
use crate::profiles::queries::{find_account, find_profile};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Effective role of the caller for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Company,
    Applicant,
    /// Not signed in, or signed in without a profile.
    Anonymous,
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, edit and delete own job postings; company dashboard.
    ManageJobs,
    /// Apply to jobs; applicant dashboard.
    ApplyToJobs,
    /// Read and edit one's own profile.
    ManageProfile,
}

impl Capability {
    fn denial(&self) -> &'static str {
        match self {
            Capability::ManageJobs => "Only companies can perform this action.",
            Capability::ApplyToJobs => "Only applicants can apply for jobs.",
            Capability::ManageProfile => "A user account is required.",
        }
    }
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageJobs => *self == Role::Company,
            Capability::ApplyToJobs => *self == Role::Applicant,
            Capability::ManageProfile => true,
        }
    }
}

/// The caller, resolved from the request headers.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub account: Option<Account>,
    /// `None` for anonymous callers and for accounts that have not set up a profile.
    pub profile: Option<Profile>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.account.as_ref().map(|a| a.id)
    }

    pub fn role(&self) -> Role {
        match self.profile.as_ref().map(Profile::role) {
            Some(ProfileRole::Company) => Role::Company,
            Some(ProfileRole::Applicant) => Role::Applicant,
            None => Role::Anonymous,
        }
    }

    /// Single capability check: 401 without an account, 403 when the role lacks it.
    pub fn require(&self, capability: Capability) -> Result<&Account, AppError> {
        let account = self.account.as_ref().ok_or(AppError::Unauthorized)?;
        if self.role().allows(capability) {
            Ok(account)
        } else {
            Err(AppError::Forbidden(capability.denial().to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Viewer::anonymous());
        };

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(AppError::Unauthorized)?;

        let account = find_account(&state.db, user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let profile = find_profile(&state.db, user_id).await?;

        Ok(Viewer {
            account: Some(account),
            profile,
        })
    }
}
