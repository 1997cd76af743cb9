use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::Viewer;
use crate::chat::briefing::build_briefing;
use crate::chat::classify::{classify_message, quick_suggestions};
use crate::chat::conversation::{
    exchange, validate_message, validate_session_id, Conversation, ExchangeRequest,
};
use crate::errors::AppError;
use crate::models::chat::ChatMessage;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub message_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for HistoryEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            kind: message.role,
            content: message.content,
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub message_id: Option<Uuid>,
    pub is_helpful: Option<bool>,
    #[serde(default)]
    pub feedback_text: String,
}

/// Blank ids count as absent; anything else must be well-formed.
fn optional_session_id(raw: Option<&str>) -> Result<Option<&str>, AppError> {
    match raw.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => {
            validate_session_id(id)?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

fn required_session_id(raw: Option<&str>) -> Result<&str, AppError> {
    optional_session_id(raw)?
        .ok_or_else(|| AppError::Validation("session_id is required".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    viewer: Viewer,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = body?;
    let message = validate_message(&request.message)?;
    let session_id = optional_session_id(request.session_id.as_deref())?;

    let settings = &state.config.chat;
    let message_type = classify_message(message, viewer.role());
    let briefing = build_briefing(
        &state.db,
        &viewer,
        message,
        message_type,
        settings.briefing_recent_jobs,
    )
    .await;

    let conversation = Conversation::new(state.chat_store.as_ref());
    let outcome = exchange(
        &conversation,
        state.llm.as_ref(),
        settings,
        ExchangeRequest {
            session_id,
            owner: viewer.user_id(),
            message_type,
            message,
            briefing: &briefing,
        },
    )
    .await?;

    Ok(Json(ChatResponse {
        response: outcome.reply.content,
        session_id: outcome.session_id,
        message_id: outcome.reply.id,
    }))
}

/// GET /api/v1/chat/history?session_id=…
pub async fn handle_history(
    State(state): State<AppState>,
    params: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(params) = params?;
    let session_id = required_session_id(params.session_id.as_deref())?;

    let conversation = Conversation::new(state.chat_store.as_ref());
    let (session, messages) = conversation
        .history(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(HistoryResponse {
        history: messages.into_iter().map(HistoryEntry::from).collect(),
        session_id: session.session_id,
    }))
}

/// POST /api/v1/chat/clear
pub async fn handle_clear(
    State(state): State<AppState>,
    body: Result<Json<ClearRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = body?;
    let session_id = required_session_id(request.session_id.as_deref())?;

    Conversation::new(state.chat_store.as_ref())
        .clear(session_id)
        .await?;

    Ok(Json(json!({ "message": "cleared" })))
}

/// POST /api/v1/chat/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    viewer: Viewer,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = body?;
    let (Some(message_id), Some(is_helpful)) = (request.message_id, request.is_helpful) else {
        return Err(AppError::Validation(
            "message_id and is_helpful are required".to_string(),
        ));
    };

    Conversation::new(state.chat_store.as_ref())
        .submit_feedback(
            message_id,
            viewer.user_id(),
            is_helpful,
            request.feedback_text.trim(),
        )
        .await?;

    info!("Recorded feedback on message {message_id} (helpful: {is_helpful})");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/v1/chat/suggestions
pub async fn handle_suggestions(viewer: Viewer) -> Json<Value> {
    Json(json!({ "suggestions": quick_suggestions(viewer.role()) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_session_id_is_absent() {
        assert_eq!(optional_session_id(None).unwrap(), None);
        assert_eq!(optional_session_id(Some("   ")).unwrap(), None);
        assert_eq!(optional_session_id(Some(" abc ")).unwrap(), Some("abc"));
        assert!(optional_session_id(Some("a b")).is_err());
    }

    #[test]
    fn test_required_session_id_rejects_missing() {
        match required_session_id(None) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "session_id is required"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_request_defaults_missing_message_to_empty() {
        let request: ChatRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.message, "");
        assert!(request.session_id.is_none());
    }

    #[test]
    fn test_history_entry_serializes_role_as_type() {
        let entry = HistoryEntry {
            id: Uuid::nil(),
            kind: "assistant".to_string(),
            content: "hi".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "assistant");
        assert!(value.get("kind").is_none());
    }
}
