use std::sync::Arc;

use sqlx::PgPool;

use crate::chat::store::ChatStore;
use crate::config::Config;
use crate::llm_client::CompletionBackend;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Session/message/feedback persistence. Default: `PgChatStore` over `db`.
    pub chat_store: Arc<dyn ChatStore>,
    /// Language-model backend. Default: `LlmClient` (Anthropic Messages API).
    pub llm: Arc<dyn CompletionBackend>,
    pub config: Config,
}
