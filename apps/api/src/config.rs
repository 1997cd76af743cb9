use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Optional: without it every chat turn degrades to the fallback apology.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub chat: ChatSettings,
}

/// Tunables for the chatbot exchange.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Number of prior turns sent to the language model.
    pub history_window: usize,
    pub max_tokens: u32,
    /// Number of active jobs listed in the briefing.
    pub briefing_recent_jobs: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_window: 10,
            max_tokens: 500,
            briefing_recent_jobs: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ChatSettings::default();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            chat: ChatSettings {
                history_window: parse_env("CHAT_HISTORY_WINDOW", defaults.history_window)?,
                max_tokens: parse_env("CHAT_MAX_TOKENS", defaults.max_tokens)?,
                briefing_recent_jobs: parse_env(
                    "BRIEFING_RECENT_JOBS",
                    defaults.briefing_recent_jobs,
                )?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
