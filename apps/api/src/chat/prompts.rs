// Prompt text and user-facing fallback strings for the chatbot.

/// Static description of the platform. First block of every briefing.
pub const PLATFORM_OVERVIEW: &str = "\
You are JobBoard AI Assistant, a helpful chatbot for a job board platform. Here's what you need to know:

PLATFORM FEATURES:
- Job posting and searching
- User profiles (Companies and Job Seekers)
- Job applications with resume uploads
- Company profiles with detailed information
- Job types: Full-time, Part-time, Contract, Remote

USER ROLES:
- Companies: Can post jobs, view applications, manage company profile
- Applicants: Can search jobs, apply to jobs, manage applicant profile

KEY FUNCTIONALITY:
- Browse jobs by location, type, company
- Apply to jobs with resume and cover letter
- Companies can manage posted jobs and view applications
- Profile management for both user types

Be helpful, professional, and guide users through the platform features. \
Only state facts about jobs and users that appear in the context below.";

pub const ANONYMOUS_USER_CONTEXT: &str =
    "User is not logged in. They can browse jobs but need to register to apply.";

pub const NO_ACTIVE_JOBS: &str = "No active jobs currently posted.";

pub const JOBS_UNAVAILABLE: &str = "Job listings are temporarily unavailable.";

/// Persisted as the assistant turn when the model quota is exhausted.
pub const QUOTA_FALLBACK: &str =
    "Our AI assistant is currently unavailable due to quota limits. Please try again later.";

/// Persisted as the assistant turn for every other model failure.
pub const GENERIC_FALLBACK: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again later.";

pub const ACTIVITY_UNAVAILABLE: &str = "Site statistics are temporarily unavailable.";

pub const NO_MATCHING_JOBS: &str = "No open jobs match this question.";

pub const SEARCH_UNAVAILABLE: &str = "Job search is temporarily unavailable.";

pub const NO_APPLICATIONS: &str = "The user has not applied to any jobs yet.";

pub const APPLICATIONS_UNAVAILABLE: &str = "The user's applications are temporarily unavailable.";

pub const NO_POSTED_JOBS: &str = "The user has not posted any jobs yet.";

pub const POSTED_JOBS_UNAVAILABLE: &str = "The user's job postings are temporarily unavailable.";
