//! Keyword classification of user messages and role-based quick suggestions.

use serde::Serialize;

use crate::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    JobSearch,
    JobPosting,
    ProfileHelp,
    ApplicationTips,
    General,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::JobSearch => "job_search",
            MessageType::JobPosting => "job_posting",
            MessageType::ProfileHelp => "profile_help",
            MessageType::ApplicationTips => "application_tips",
            MessageType::General => "general",
        }
    }
}

const JOB_WORDS: &[&str] = &["job", "position", "work", "career", "hiring"];
const PROFILE_WORDS: &[&str] = &["profile", "resume", "cv", "skills"];
const APPLICATION_WORDS: &[&str] = &["apply", "application", "interview"];

/// First matching group wins, in the order job, profile, application.
pub fn classify_message(message: &str, role: Role) -> MessageType {
    let lowered = message.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if mentions(JOB_WORDS) {
        if role == Role::Company {
            MessageType::JobPosting
        } else {
            MessageType::JobSearch
        }
    } else if mentions(PROFILE_WORDS) {
        MessageType::ProfileHelp
    } else if mentions(APPLICATION_WORDS) {
        MessageType::ApplicationTips
    } else {
        MessageType::General
    }
}

pub fn quick_suggestions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Applicant => &[
            "Find jobs for me",
            "How to improve my profile?",
            "Application tips",
            "What jobs match my skills?",
        ],
        Role::Company => &[
            "How to write a good job post?",
            "Find qualified candidates",
            "Hiring best practices",
            "Review my job postings",
        ],
        Role::Anonymous => &[
            "How does this platform work?",
            "Show me recent jobs",
            "How to create an account?",
            "Platform features",
        ],
    }
}
