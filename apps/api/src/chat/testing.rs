//! Test doubles for the chat seams: an in-memory `ChatStore` and a scripted
//! `CompletionBackend`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::chat::store::{ChatStore, NewFeedback, NewMessage};
use crate::llm_client::{CompletionBackend, CompletionRequest, LlmError};
use crate::models::chat::{ChatMessage, ChatSession, Feedback, MessageRole};

#[derive(Default)]
struct Tables {
    sessions: Vec<ChatSession>,
    messages: Vec<ChatMessage>,
    feedback: Vec<Feedback>,
    next_seq: i64,
}

#[derive(Default)]
pub struct MemoryChatStore {
    tables: Mutex<Tables>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feedback_rows(&self) -> Vec<Feedback> {
        self.tables.lock().unwrap().feedback.clone()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned())
    }

    async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<ChatSession, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.sessions.iter().any(|s| s.session_id == session_id) {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate session_id {session_id}"
            )));
        }
        let session = ChatSession {
            session_id: session_id.to_string(),
            user_id,
            created_at: Utc::now(),
            is_active: true,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn deactivate_session(&self, session_id: &str) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(session) = tables
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
        {
            session.is_active = false;
        }
        Ok(())
    }

    async fn insert_message(&self, message: NewMessage<'_>) -> Result<ChatMessage, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if !tables
            .sessions
            .iter()
            .any(|s| s.session_id == message.session_id)
        {
            return Err(sqlx::Error::RowNotFound);
        }
        tables.next_seq += 1;
        let row = ChatMessage {
            id: Uuid::new_v4(),
            seq: tables.next_seq,
            session_id: message.session_id.to_string(),
            role: message.role.as_str().to_string(),
            content: message.content.to_string(),
            metadata: message.metadata,
            created_at: Utc::now(),
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let all = self.messages(session_id).await?;
        let turns: Vec<ChatMessage> = all
            .into_iter()
            .filter(|m| matches!(m.role(), Some(MessageRole::User | MessageRole::Assistant)))
            .collect();
        let skip = turns.len().saturating_sub(limit.max(0) as usize);
        Ok(turns.into_iter().skip(skip).collect())
    }

    async fn messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.seq));
        Ok(rows)
    }

    async fn message_exists(&self, message_id: Uuid) -> Result<bool, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.messages.iter().any(|m| m.id == message_id))
    }

    async fn upsert_feedback(&self, feedback: NewFeedback<'_>) -> Result<Feedback, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = tables
            .feedback
            .iter_mut()
            .find(|f| f.message_id == feedback.message_id && f.user_id == feedback.user_id)
        {
            existing.is_helpful = feedback.is_helpful;
            existing.feedback_text = feedback.feedback_text.to_string();
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let row = Feedback {
            id: Uuid::new_v4(),
            message_id: feedback.message_id,
            user_id: feedback.user_id,
            is_helpful: feedback.is_helpful,
            feedback_text: feedback.feedback_text.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.feedback.push(row.clone());
        Ok(row)
    }
}

/// Replays queued outcomes in order; answers "ok" once the queue is empty.
#[derive(Default)]
pub struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_reply(self, text: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn then_fail(self, error: LlmError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}
