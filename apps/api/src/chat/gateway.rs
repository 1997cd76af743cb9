//! Language-model gateway: one completion call per user turn.
//!
//! Upstream failures never reach the caller: they are logged and replaced by a
//! fixed apology, which the conversation persists like any other reply.

use tracing::{error, warn};

use crate::chat::prompts::{GENERIC_FALLBACK, QUOTA_FALLBACK};
use crate::llm_client::{CompletionBackend, CompletionRequest, PromptRole, PromptTurn};
use crate::models::chat::{ChatMessage, MessageRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Quota,
    Unavailable,
}

impl Fallback {
    pub fn text(&self) -> &'static str {
        match self {
            Fallback::Quota => QUOTA_FALLBACK,
            Fallback::Unavailable => GENERIC_FALLBACK,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Fallback::Quota => "quota",
            Fallback::Unavailable => "unavailable",
        }
    }
}

/// Assistant text plus which fallback, if any, produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub fallback: Option<Fallback>,
}

/// Assembles the prompt: prior user/assistant turns in order, then `message`.
///
/// System rows are skipped, and leading assistant turns are dropped because
/// the Messages API requires the conversation to open with a user turn.
pub fn build_request(
    briefing: &str,
    history: &[ChatMessage],
    message: &str,
    max_tokens: u32,
) -> CompletionRequest {
    let mut turns: Vec<PromptTurn> = history
        .iter()
        .filter_map(|m| {
            let role = match m.role()? {
                MessageRole::User => PromptRole::User,
                MessageRole::Assistant => PromptRole::Assistant,
                MessageRole::System => return None,
            };
            Some(PromptTurn {
                role,
                content: m.content.clone(),
            })
        })
        .skip_while(|t| t.role == PromptRole::Assistant)
        .collect();

    turns.push(PromptTurn {
        role: PromptRole::User,
        content: message.to_string(),
    });

    CompletionRequest {
        system: briefing.to_string(),
        turns,
        max_tokens,
    }
}

pub async fn generate_reply(
    backend: &dyn CompletionBackend,
    briefing: &str,
    history: &[ChatMessage],
    message: &str,
    max_tokens: u32,
) -> Reply {
    let request = build_request(briefing, history, message, max_tokens);

    match backend.complete(&request).await {
        Ok(text) => Reply {
            text,
            fallback: None,
        },
        Err(e) => {
            let fallback = if e.is_quota() {
                warn!("LLM quota exhausted: {e}");
                Fallback::Quota
            } else {
                error!("LLM call failed: {e}");
                Fallback::Unavailable
            };
            Reply {
                text: fallback.text().to_string(),
                fallback: Some(fallback),
            }
        }
    }
}
