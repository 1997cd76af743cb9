use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Employment type. Stored as its two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "FT")]
    FullTime,
    #[serde(rename = "PT")]
    PartTime,
    #[serde(rename = "CN")]
    Contract,
    #[serde(rename = "RM")]
    Remote,
}

impl JobType {
    pub fn code(&self) -> &'static str {
        match self {
            JobType::FullTime => "FT",
            JobType::PartTime => "PT",
            JobType::Contract => "CN",
            JobType::Remote => "RM",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Remote => "Remote",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FT" => Some(JobType::FullTime),
            "PT" => Some(JobType::PartTime),
            "CN" => Some(JobType::Contract),
            "RM" => Some(JobType::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub requirements: String,
    pub job_type: String,
    pub posted_by: Uuid,
    pub salary: String,
    pub date_posted: DateTime<Utc>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Job {
    /// Human-readable job type; falls back to the raw code.
    pub fn job_type_display(&self) -> &str {
        JobType::from_code(&self.job_type)
            .map(|t| t.display_name())
            .unwrap_or(&self.job_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub portfolio: String,
    pub cover_letter: String,
    pub date_applied: DateTime<Utc>,
}
