// Chatbot assistant: briefing construction, conversation persistence and the
// language-model exchange. All model calls go through `llm_client`.

pub mod briefing;
pub mod classify;
pub mod conversation;
pub mod gateway;
pub mod handlers;
pub mod prompts;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
