//! Briefing builder: renders platform and caller state, plus data picked for
//! the question being asked, into the system text sent to the language model.
//!
//! Loading never fails: each query that errors is logged and replaced by a
//! fallback sentence, so a degraded database still yields a usable briefing.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{Role, Viewer};
use crate::chat::classify::MessageType;
use crate::chat::prompts::{
    ACTIVITY_UNAVAILABLE, ANONYMOUS_USER_CONTEXT, APPLICATIONS_UNAVAILABLE, JOBS_UNAVAILABLE,
    NO_ACTIVE_JOBS, NO_APPLICATIONS, NO_MATCHING_JOBS, NO_POSTED_JOBS, PLATFORM_OVERVIEW,
    POSTED_JOBS_UNAVAILABLE, SEARCH_UNAVAILABLE,
};
use crate::dashboard::queries::{
    applications_submitted, platform_stats, popular_posted_jobs, ApplicationSummary,
    JobWithApplications,
};
use crate::jobs::queries::{
    count_active_jobs_posted_by, count_applications_by, like_pattern, recent_active_jobs,
    search_active_jobs,
};
use crate::models::job::Job;
use crate::models::user::ProfileRole;

/// Rows listed per block of the relevant-data section.
const RELEVANT_LIMIT: i64 = 5;
const MIN_TERM_CHARS: usize = 3;
const MAX_TERMS: usize = 8;
/// Words too common in job questions to narrow a search.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "any", "are", "can", "find", "show", "looking", "want",
    "need", "what", "which", "where", "there", "some", "about", "job", "jobs", "position",
    "positions", "work", "career", "careers", "hiring", "you", "your", "open", "available",
];

/// Role-specific facts about the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum UserContext {
    Anonymous,
    NoProfile {
        username: String,
    },
    Company {
        username: String,
        company_name: Option<String>,
        industry: Option<String>,
        /// `None` when the count could not be loaded.
        active_jobs: Option<i64>,
    },
    Applicant {
        username: String,
        applications: Option<i64>,
        experience_years: i32,
        skills: Option<String>,
    },
}

/// One job as listed in the briefing.
#[derive(Debug, Clone, PartialEq)]
pub struct JobLine {
    pub title: String,
    pub company: String,
    pub job_type: String,
    pub location: String,
}

impl From<&Job> for JobLine {
    fn from(job: &Job) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            job_type: job.job_type_display().to_string(),
            location: job.location.clone(),
        }
    }
}

/// One of the caller's applications.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedLine {
    pub job_title: String,
    pub company: String,
}

impl From<&ApplicationSummary> for AppliedLine {
    fn from(application: &ApplicationSummary) -> Self {
        Self {
            job_title: application.job_title.clone(),
            company: application.company.clone(),
        }
    }
}

/// One of the caller's postings with its application count.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedLine {
    pub title: String,
    pub applications: i64,
}

impl From<&JobWithApplications> for PostedLine {
    fn from(posted: &JobWithApplications) -> Self {
        Self {
            title: posted.job.title.clone(),
            applications: posted.application_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteActivity {
    pub active_jobs: i64,
    pub total_applications: i64,
}

/// Data chosen from the message type and the caller's role.
/// A `None` list means its query failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Focus {
    Nothing,
    JobMatches {
        matches: Option<Vec<JobLine>>,
    },
    ApplicantJobMatches {
        matches: Option<Vec<JobLine>>,
        applications: Option<Vec<AppliedLine>>,
    },
    PostedJobs {
        jobs: Option<Vec<PostedLine>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelevantData {
    pub activity: Option<SiteActivity>,
    pub focus: Focus,
}

/// Words of the question worth matching against postings, lowercased and
/// deduplicated.
pub fn search_terms(message: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in message.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#')) {
        let word = word.to_lowercase();
        if word.chars().count() < MIN_TERM_CHARS
            || STOP_WORDS.contains(&word.as_str())
            || terms.contains(&word)
        {
            continue;
        }
        terms.push(word);
        if terms.len() == MAX_TERMS {
            break;
        }
    }
    terms
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
}

fn count_or_unavailable(count: Option<i64>) -> String {
    count.map_or_else(|| "unavailable".to_string(), |n| n.to_string())
}

pub fn render_user_context(user: &UserContext) -> String {
    match user {
        UserContext::Anonymous => ANONYMOUS_USER_CONTEXT.to_string(),
        UserContext::NoProfile { username } => {
            format!("User: {username} (No profile set up yet)")
        }
        UserContext::Company {
            username,
            company_name,
            industry,
            active_jobs,
        } => format!(
            "User: {username} ({})\nCompany: {}\nActive job postings: {}\nIndustry: {}",
            ProfileRole::Company.display_name(),
            or_placeholder(company_name, "Not set"),
            count_or_unavailable(*active_jobs),
            or_placeholder(industry, "Not specified"),
        ),
        UserContext::Applicant {
            username,
            applications,
            experience_years,
            skills,
        } => format!(
            "User: {username} ({})\nApplications submitted: {}\nExperience: {experience_years} years\nSkills: {}",
            ProfileRole::Applicant.display_name(),
            count_or_unavailable(*applications),
            or_placeholder(skills, "Not specified"),
        ),
    }
}

/// Heading plus one line per item; `None` renders `unavailable`.
fn render_list<T>(
    items: Option<&[T]>,
    heading: &str,
    empty: &str,
    unavailable: &str,
    line: impl Fn(&T) -> String,
) -> String {
    match items {
        None => unavailable.to_string(),
        Some([]) => empty.to_string(),
        Some(items) => {
            let mut out = heading.to_string();
            for item in items {
                out.push('\n');
                out.push_str(&line(item));
            }
            out
        }
    }
}

fn job_line(job: &JobLine) -> String {
    format!(
        "- {} at {} ({}) - {}",
        job.title, job.company, job.job_type, job.location
    )
}

/// `None` means the job query failed.
pub fn render_jobs(jobs: Option<&[JobLine]>) -> String {
    render_list(
        jobs,
        "Recent job postings:",
        NO_ACTIVE_JOBS,
        JOBS_UNAVAILABLE,
        job_line,
    )
}

pub fn render_relevant_data(data: &RelevantData) -> String {
    let mut blocks = vec![match data.activity {
        Some(activity) => format!(
            "Site statistics: {} active jobs, {} total applications",
            activity.active_jobs, activity.total_applications
        ),
        None => ACTIVITY_UNAVAILABLE.to_string(),
    }];

    let render_matches = |matches: &Option<Vec<JobLine>>| {
        render_list(
            matches.as_deref(),
            "Relevant jobs:",
            NO_MATCHING_JOBS,
            SEARCH_UNAVAILABLE,
            job_line,
        )
    };

    match &data.focus {
        Focus::Nothing => {}
        Focus::JobMatches { matches } => blocks.push(render_matches(matches)),
        Focus::ApplicantJobMatches {
            matches,
            applications,
        } => {
            blocks.push(render_matches(matches));
            blocks.push(render_list(
                applications.as_deref(),
                "Recent applications:",
                NO_APPLICATIONS,
                APPLICATIONS_UNAVAILABLE,
                |a| format!("- Applied to {} at {}", a.job_title, a.company),
            ));
        }
        Focus::PostedJobs { jobs } => blocks.push(render_list(
            jobs.as_deref(),
            "Posted jobs:",
            NO_POSTED_JOBS,
            POSTED_JOBS_UNAVAILABLE,
            |j| format!("- {} ({} applications)", j.title, j.applications),
        )),
    }

    blocks.join("\n")
}

pub fn render_briefing(
    user: &UserContext,
    jobs: Option<&[JobLine]>,
    relevant: &RelevantData,
) -> String {
    format!(
        "{PLATFORM_OVERVIEW}\n\nUSER CONTEXT:\n{}\n\nCURRENT JOBS:\n{}\n\nRELEVANT DATA:\n{}",
        render_user_context(user),
        render_jobs(jobs),
        render_relevant_data(relevant)
    )
}

/// Loads caller facts, up to `recent_jobs` active postings and the data
/// relevant to `message`, then renders the briefing.
pub async fn build_briefing(
    pool: &PgPool,
    viewer: &Viewer,
    message: &str,
    message_type: MessageType,
    recent_jobs: u32,
) -> String {
    let (user, jobs, relevant) = tokio::join!(
        load_user_context(pool, viewer),
        load_recent_jobs(pool, recent_jobs),
        load_relevant_data(pool, viewer, message, message_type),
    );

    render_briefing(&user, jobs.as_deref(), &relevant)
}

async fn load_recent_jobs(pool: &PgPool, limit: u32) -> Option<Vec<JobLine>> {
    match recent_active_jobs(pool, i64::from(limit)).await {
        Ok(jobs) => Some(jobs.iter().map(JobLine::from).collect()),
        Err(e) => {
            warn!("Briefing: failed to load recent jobs: {e}");
            None
        }
    }
}

async fn load_matches(
    pool: &PgPool,
    message: &str,
    exclude_applicant: Option<Uuid>,
) -> Option<Vec<JobLine>> {
    let patterns: Vec<String> = search_terms(message)
        .iter()
        .map(|term| like_pattern(term))
        .collect();
    search_active_jobs(pool, &patterns, exclude_applicant, RELEVANT_LIMIT)
        .await
        .map(|jobs| jobs.iter().map(JobLine::from).collect())
        .map_err(|e| warn!("Briefing: job search failed: {e}"))
        .ok()
}

async fn load_relevant_data(
    pool: &PgPool,
    viewer: &Viewer,
    message: &str,
    message_type: MessageType,
) -> RelevantData {
    let activity = async {
        platform_stats(pool)
            .await
            .map(|stats| SiteActivity {
                active_jobs: stats.total_jobs,
                total_applications: stats.total_applications,
            })
            .map_err(|e| warn!("Briefing: failed to load site statistics: {e}"))
            .ok()
    };

    let focus = async {
        match (message_type, viewer.role(), &viewer.account) {
            (MessageType::JobSearch, Role::Applicant, Some(account)) => {
                let applications = async {
                    applications_submitted(pool, account.id, RELEVANT_LIMIT)
                        .await
                        .map(|rows| rows.iter().map(AppliedLine::from).collect())
                        .map_err(|e| {
                            warn!("Briefing: failed to load applications for {}: {e}", account.id)
                        })
                        .ok()
                };
                let (matches, applications) =
                    tokio::join!(load_matches(pool, message, Some(account.id)), applications);
                Focus::ApplicantJobMatches {
                    matches,
                    applications,
                }
            }
            (MessageType::JobSearch, _, _) => Focus::JobMatches {
                matches: load_matches(pool, message, None).await,
            },
            (MessageType::JobPosting, Role::Company, Some(account)) => Focus::PostedJobs {
                jobs: popular_posted_jobs(pool, account.id, RELEVANT_LIMIT)
                    .await
                    .map(|rows| rows.iter().map(PostedLine::from).collect())
                    .map_err(|e| {
                        warn!("Briefing: failed to load posted jobs for {}: {e}", account.id)
                    })
                    .ok(),
            },
            _ => Focus::Nothing,
        }
    };

    let (activity, focus) = tokio::join!(activity, focus);
    RelevantData { activity, focus }
}

async fn load_user_context(pool: &PgPool, viewer: &Viewer) -> UserContext {
    let Some(account) = &viewer.account else {
        return UserContext::Anonymous;
    };
    let username = account.username.clone();

    let Some(profile) = &viewer.profile else {
        return UserContext::NoProfile { username };
    };

    match profile.role() {
        ProfileRole::Company => {
            let active_jobs = count_active_jobs_posted_by(pool, account.id)
                .await
                .map_err(|e| warn!("Briefing: failed to count jobs for {}: {e}", account.id))
                .ok();
            UserContext::Company {
                username,
                company_name: profile.company_name.clone(),
                industry: profile.industry.clone(),
                active_jobs,
            }
        }
        ProfileRole::Applicant => {
            let applications = count_applications_by(pool, account.id)
                .await
                .map_err(|e| warn!("Briefing: failed to count applications for {}: {e}", account.id))
                .ok();
            UserContext::Applicant {
                username,
                applications,
                experience_years: profile.experience_years,
                skills: profile.skills.clone(),
            }
        }
    }
}
