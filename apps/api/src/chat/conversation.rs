//! Conversation manager: session lifecycle and the append-only turn log.
//!
//! Session states: NEW (no row) → ACTIVE (`is_active = true`) → CLEARED
//! (`is_active = false`). CLEARED is terminal: a cleared id is never resumed,
//! the next message under it starts a fresh session with a new id.

use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::classify::MessageType;
use crate::chat::gateway::generate_reply;
use crate::chat::store::{ChatStore, NewFeedback, NewMessage};
use crate::config::ChatSettings;
use crate::errors::AppError;
use crate::llm_client::CompletionBackend;
use crate::models::chat::{ChatMessage, ChatSession, Feedback, MessageRole};

pub const MAX_SESSION_ID_LEN: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Session ids are opaque to clients but restricted to a URL-safe alphabet.
pub fn validate_session_id(session_id: &str) -> Result<(), AppError> {
    let well_formed = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid session_id".to_string()))
    }
}

/// Trims the message and rejects empty or oversized input.
pub fn validate_message(message: &str) -> Result<&str, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(message)
}

fn mint_session_id() -> String {
    Uuid::new_v4().to_string()
}

pub struct Conversation<'a> {
    store: &'a dyn ChatStore,
}

impl<'a> Conversation<'a> {
    pub fn new(store: &'a dyn ChatStore) -> Self {
        Self { store }
    }

    /// Resumes `session_id` if it names an ACTIVE session; otherwise starts a
    /// new session owned by `owner`.
    pub async fn get_or_create(
        &self,
        session_id: Option<&str>,
        owner: Option<Uuid>,
    ) -> Result<ChatSession, AppError> {
        if let Some(id) = session_id {
            match self.store.find_session(id).await? {
                Some(session) if session.is_active => return Ok(session),
                Some(_) => debug!("Session {id} was cleared; starting a new one"),
                None => debug!("Session {id} not found; starting a new one"),
            }
        }

        let session = self.store.create_session(&mint_session_id(), owner).await?;
        info!(
            "Created chat session {} (owner: {:?})",
            session.session_id, session.user_id
        );
        Ok(session)
    }

    pub async fn append(
        &self,
        session: &ChatSession,
        role: MessageRole,
        content: &str,
        metadata: Value,
    ) -> Result<ChatMessage, AppError> {
        Ok(self
            .store
            .insert_message(NewMessage {
                session_id: &session.session_id,
                role,
                content,
                metadata,
            })
            .await?)
    }

    /// The last `k` user/assistant turns, oldest first.
    pub async fn recent_history(
        &self,
        session: &ChatSession,
        k: usize,
    ) -> Result<Vec<ChatMessage>, AppError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        Ok(self
            .store
            .recent_messages(&session.session_id, limit)
            .await?)
    }

    /// Idempotent; unknown ids are ignored.
    pub async fn clear(&self, session_id: &str) -> Result<(), AppError> {
        self.store.deactivate_session(session_id).await?;
        info!("Cleared chat session {session_id}");
        Ok(())
    }

    /// Full log of a session, or `None` if the id is unknown.
    pub async fn history(
        &self,
        session_id: &str,
    ) -> Result<Option<(ChatSession, Vec<ChatMessage>)>, AppError> {
        let Some(session) = self.store.find_session(session_id).await? else {
            return Ok(None);
        };
        let messages = self.store.messages(session_id).await?;
        Ok(Some((session, messages)))
    }

    pub async fn submit_feedback(
        &self,
        message_id: Uuid,
        user_id: Option<Uuid>,
        is_helpful: bool,
        feedback_text: &str,
    ) -> Result<Feedback, AppError> {
        if !self.store.message_exists(message_id).await? {
            return Err(AppError::NotFound("Message not found".to_string()));
        }
        Ok(self
            .store
            .upsert_feedback(NewFeedback {
                message_id,
                user_id,
                is_helpful,
                feedback_text,
            })
            .await?)
    }
}

/// Inputs for one user turn.
pub struct ExchangeRequest<'a> {
    pub session_id: Option<&'a str>,
    pub owner: Option<Uuid>,
    /// Classification of `message`, recorded on the assistant turn.
    pub message_type: MessageType,
    pub message: &'a str,
    pub briefing: &'a str,
}

#[derive(Debug)]
pub struct ExchangeOutcome {
    pub session_id: String,
    pub reply: ChatMessage,
}

/// Runs one round trip: resolve session, read history, persist the user turn,
/// call the model, persist the assistant turn.
///
/// The assistant row is written only after the gateway returns, and always
/// holds either the model text or the fallback apology.
pub async fn exchange(
    conversation: &Conversation<'_>,
    backend: &dyn CompletionBackend,
    settings: &ChatSettings,
    request: ExchangeRequest<'_>,
) -> Result<ExchangeOutcome, AppError> {
    let session = conversation
        .get_or_create(request.session_id, request.owner)
        .await?;

    let history = conversation
        .recent_history(&session, settings.history_window)
        .await?;

    conversation
        .append(&session, MessageRole::User, request.message, json!({}))
        .await?;

    let reply = generate_reply(
        backend,
        request.briefing,
        &history,
        request.message,
        settings.max_tokens,
    )
    .await;

    let mut metadata = json!({
        "message_type": request.message_type.as_str(),
        "fallback": reply.fallback.is_some(),
    });
    if let Some(fallback) = reply.fallback {
        metadata["fallback_reason"] = json!(fallback.as_str());
    }

    let stored = conversation
        .append(&session, MessageRole::Assistant, &reply.text, metadata)
        .await?;

    Ok(ExchangeOutcome {
        session_id: session.session_id,
        reply: stored,
    })
}
