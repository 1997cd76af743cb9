//! Chat persistence: trait-based store for sessions, messages and feedback.
//!
//! Default: `PgChatStore` over the shared Postgres pool.
//! `AppState` holds an `Arc<dyn ChatStore>`.
//!
//! Messages are append-only: there is no update or delete for `chat_messages`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatSession, Feedback, MessageRole};

/// A turn to append to a session.
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub session_id: &'a str,
    pub role: MessageRole,
    pub content: &'a str,
    pub metadata: Value,
}

/// Feedback to record for one (message, user) pair.
#[derive(Debug, Clone)]
pub struct NewFeedback<'a> {
    pub message_id: Uuid,
    pub user_id: Option<Uuid>,
    pub is_helpful: bool,
    pub feedback_text: &'a str,
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, sqlx::Error>;

    async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<ChatSession, sqlx::Error>;

    /// Sets `is_active = false`. Unknown ids are a no-op.
    async fn deactivate_session(&self, session_id: &str) -> Result<(), sqlx::Error>;

    async fn insert_message(&self, message: NewMessage<'_>) -> Result<ChatMessage, sqlx::Error>;

    /// The last `limit` user/assistant turns, oldest first.
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error>;

    /// Every turn of the session, oldest first.
    async fn messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error>;

    async fn message_exists(&self, message_id: Uuid) -> Result<bool, sqlx::Error>;

    /// Inserts or updates the single feedback row for (message, user).
    async fn upsert_feedback(&self, feedback: NewFeedback<'_>) -> Result<Feedback, sqlx::Error>;
}

/// Postgres-backed chat store.
#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, sqlx::Error> {
        sqlx::query_as::<_, ChatSession>("SELECT * FROM chat_sessions WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<ChatSession, sqlx::Error> {
        sqlx::query_as::<_, ChatSession>(
            "INSERT INTO chat_sessions (session_id, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn deactivate_session(&self, session_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chat_sessions SET is_active = FALSE WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_message(&self, message: NewMessage<'_>) -> Result<ChatMessage, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (id, session_id, role, content, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.session_id)
        .bind(message.role.as_str())
        .bind(message.content)
        .bind(&message.metadata)
        .fetch_one(&self.pool)
        .await
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM (
                SELECT * FROM chat_messages
                WHERE session_id = $1 AND role IN ('user', 'assistant')
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE session_id = $1 ORDER BY created_at ASC, seq ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn message_exists(&self, message_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chat_messages WHERE id = $1)")
            .bind(message_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn upsert_feedback(&self, feedback: NewFeedback<'_>) -> Result<Feedback, sqlx::Error> {
        // The conflict target must match chat_feedback_message_user_idx exactly.
        sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO chat_feedback (id, message_id, user_id, is_helpful, feedback_text)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (message_id, (COALESCE(user_id, '00000000-0000-0000-0000-000000000000'::uuid)))
            DO UPDATE SET
                is_helpful    = EXCLUDED.is_helpful,
                feedback_text = EXCLUDED.feedback_text,
                updated_at    = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(feedback.message_id)
        .bind(feedback.user_id)
        .bind(feedback.is_helpful)
        .bind(feedback.feedback_text)
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use serde_json::json;

    use super::*;

    async fn seed_user(pool: &PgPool, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, email) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(username)
            .bind(format!("{username}@example.com"))
            .execute(pool)
            .await
            .unwrap();
        id
    }

    async fn append(store: &PgChatStore, role: MessageRole, content: &str) -> ChatMessage {
        store
            .insert_message(NewMessage {
                session_id: "session-1",
                role,
                content,
                metadata: json!({}),
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_feedback_upsert_keeps_one_row_per_user(pool: PgPool) {
        let store = PgChatStore::new(pool.clone());
        store.create_session("session-1", None).await.unwrap();
        let message = append(&store, MessageRole::Assistant, "hello").await;
        let jane = seed_user(&pool, "jane").await;

        for (user_id, is_helpful, text) in [
            (None, true, "nice"),
            (None, false, "changed my mind"),
            (Some(jane), true, ""),
            (Some(jane), false, "wrong answer"),
        ] {
            store
                .upsert_feedback(NewFeedback {
                    message_id: message.id,
                    user_id,
                    is_helpful,
                    feedback_text: text,
                })
                .await
                .unwrap();
        }

        let rows: Vec<(Option<Uuid>, bool, String)> =
            sqlx::query_as("SELECT user_id, is_helpful, feedback_text FROM chat_feedback")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(rows.len(), 2);

        let anonymous = rows.iter().find(|r| r.0.is_none()).unwrap();
        assert_eq!((anonymous.1, anonymous.2.as_str()), (false, "changed my mind"));
        let signed_in = rows.iter().find(|r| r.0 == Some(jane)).unwrap();
        assert_eq!((signed_in.1, signed_in.2.as_str()), (false, "wrong answer"));
    }

    #[sqlx::test]
    async fn test_recent_messages_returns_tail_oldest_first(pool: PgPool) {
        let store = PgChatStore::new(pool);
        store.create_session("session-1", None).await.unwrap();
        append(&store, MessageRole::User, "u1").await;
        append(&store, MessageRole::Assistant, "a1").await;
        append(&store, MessageRole::System, "note").await;
        append(&store, MessageRole::User, "u2").await;
        append(&store, MessageRole::Assistant, "a2").await;

        let recent = store.recent_messages("session-1", 3).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a1", "u2", "a2"]);

        let all = store.messages("session-1").await.unwrap();
        let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["u1", "a1", "note", "u2", "a2"]);
    }

    #[sqlx::test]
    async fn test_deactivate_is_idempotent(pool: PgPool) {
        let store = PgChatStore::new(pool);
        store.create_session("session-1", None).await.unwrap();
        store.deactivate_session("session-1").await.unwrap();
        store.deactivate_session("session-1").await.unwrap();
        store.deactivate_session("unknown").await.unwrap();

        let session = store.find_session("session-1").await.unwrap().unwrap();
        assert!(!session.is_active);
    }
}
