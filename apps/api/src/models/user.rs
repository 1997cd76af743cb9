use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Role of a profile as stored in `profiles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Company,
    #[default]
    Applicant,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Company => "company",
            ProfileRole::Applicant => "applicant",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProfileRole::Company => "Company",
            ProfileRole::Applicant => "Applicant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "company" => Some(ProfileRole::Company),
            "applicant" => Some(ProfileRole::Applicant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub role: String,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub skills: Option<String>,
    pub experience_years: i32,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// The table CHECK constraint only admits the two known roles.
    pub fn role(&self) -> ProfileRole {
        ProfileRole::parse(&self.role).unwrap_or_default()
    }
}
