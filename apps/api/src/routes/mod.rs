pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::dashboard::handlers as dashboard;
use crate::jobs::handlers as jobs;
use crate::profiles::handlers as profiles;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chatbot
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/history", get(chat::handle_history))
        .route("/api/v1/chat/clear", post(chat::handle_clear))
        .route("/api/v1/chat/feedback", post(chat::handle_feedback))
        .route("/api/v1/chat/suggestions", get(chat::handle_suggestions))
        // Job board
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/apply", post(jobs::handle_apply))
        // Profiles and dashboards
        .route(
            "/api/v1/profile",
            get(profiles::handle_get_profile).put(profiles::handle_update_profile),
        )
        .route(
            "/api/v1/dashboard/company",
            get(dashboard::handle_company_dashboard),
        )
        .route(
            "/api/v1/dashboard/applicant",
            get(dashboard::handle_applicant_dashboard),
        )
        .route("/api/v1/stats", get(dashboard::handle_platform_stats))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::chat::prompts::{QUOTA_FALLBACK, SEARCH_UNAVAILABLE};
    use crate::chat::testing::{MemoryChatStore, ScriptedBackend};
    use crate::config::{ChatSettings, Config};
    use crate::llm_client::LlmError;

    // Nothing listens on port 1, so any query fails fast and exercises the
    // degraded paths instead of hanging.
    const UNREACHABLE_DB: &str = "postgres://jobboard@127.0.0.1:1/jobboard";

    fn test_state(backend: ScriptedBackend) -> AppState {
        test_state_with(Arc::new(backend))
    }

    fn test_state_with(backend: Arc<ScriptedBackend>) -> AppState {
        let db = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy(UNREACHABLE_DB)
            .unwrap();
        AppState {
            db,
            chat_store: Arc::new(MemoryChatStore::new()),
            llm: backend,
            config: Config {
                database_url: UNREACHABLE_DB.to_string(),
                db_max_connections: 1,
                anthropic_api_key: None,
                port: 0,
                rust_log: "info".to_string(),
                chat: ChatSettings::default(),
            },
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let (status, body) =
            send(&app, Method::POST, "/api/v1/chat", Some(r#"{"message": "   "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let (status, body) = send(&app, Method::POST, "/api/v1/chat", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON data");
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_rejected() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/chat",
            Some(r#"{"message": "hi", "session_id": "../etc/passwd"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid session_id");
    }

    #[tokio::test]
    async fn test_malformed_user_header_is_unauthorized() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let request = Request::builder()
            .uri("/api/v1/chat/suggestions")
            .header("x-user-id", "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_round_trips_share_a_session_and_grow_history() {
        let app = build_router(test_state(
            ScriptedBackend::new()
                .then_reply("Welcome to the job board!")
                .then_reply("Try the search page."),
        ));

        let (status, first) =
            send(&app, Method::POST, "/api/v1/chat", Some(r#"{"message": "hello"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["response"], "Welcome to the job board!");
        let session_id = first["session_id"].as_str().unwrap().to_string();
        assert!(first["message_id"].is_string());

        let follow_up = json!({ "message": "how do I search?", "session_id": session_id });
        let (status, second) = send(
            &app,
            Method::POST,
            "/api/v1/chat",
            Some(&follow_up.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["session_id"], session_id.as_str());

        let uri = format!("/api/v1/chat/history?session_id={session_id}");
        let (status, history) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = history["history"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0]["type"], "user");
        assert_eq!(entries[0]["content"], "hello");
        assert_eq!(entries[3]["type"], "assistant");
        assert_eq!(entries[3]["content"], "Try the search page.");
    }

    #[tokio::test]
    async fn test_quota_failure_still_returns_200_with_fallback() {
        let app = build_router(test_state(ScriptedBackend::new().then_fail(
            LlmError::QuotaExceeded {
                status: 429,
                message: "rate_limit_error".to_string(),
            },
        )));

        let (status, body) =
            send(&app, Method::POST, "/api/v1/chat", Some(r#"{"message": "jobs?"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], QUOTA_FALLBACK);
    }

    #[tokio::test]
    async fn test_briefing_depends_on_the_question() {
        let backend = Arc::new(ScriptedBackend::new());
        let app = build_router(test_state_with(backend.clone()));

        for message in ["find me rust jobs in Berlin", "how do I write a cover letter?"] {
            let body = json!({ "message": message }).to_string();
            let (status, _) = send(&app, Method::POST, "/api/v1/chat", Some(&body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        let (job_search, general) = (&requests[0].system, &requests[1].system);
        assert_ne!(job_search, general);
        // The database is unreachable, so the search block degrades in place.
        assert!(job_search.contains(SEARCH_UNAVAILABLE));
        assert!(!general.contains(SEARCH_UNAVAILABLE));
        assert!(general.contains("RELEVANT DATA:"));
    }

    #[tokio::test]
    async fn test_history_requires_known_session() {
        let app = build_router(test_state(ScriptedBackend::new()));

        let (status, body) = send(&app, Method::GET, "/api/v1/chat/history", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "session_id is required");

        let (status, body) =
            send(&app, Method::GET, "/api/v1/chat/history?session_id=missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_next_message_starts_fresh() {
        let app = build_router(test_state(ScriptedBackend::new()));

        let (_, first) =
            send(&app, Method::POST, "/api/v1/chat", Some(r#"{"message": "hi"}"#)).await;
        let session_id = first["session_id"].as_str().unwrap().to_string();
        let clear = json!({ "session_id": session_id }).to_string();

        for _ in 0..2 {
            let (status, body) =
                send(&app, Method::POST, "/api/v1/chat/clear", Some(&clear)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "cleared");
        }

        let again = json!({ "message": "hi again", "session_id": session_id }).to_string();
        let (_, next) = send(&app, Method::POST, "/api/v1/chat", Some(&again)).await;
        assert_ne!(next["session_id"], session_id.as_str());

        let (status, _) = send(&app, Method::POST, "/api/v1/chat/clear", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feedback_upserts_and_rejects_unknown_messages() {
        let app = build_router(test_state(ScriptedBackend::new()));

        let (_, reply) =
            send(&app, Method::POST, "/api/v1/chat", Some(r#"{"message": "hi"}"#)).await;
        let message_id = reply["message_id"].as_str().unwrap().to_string();

        for helpful in [true, false] {
            let feedback = json!({ "message_id": message_id, "is_helpful": helpful }).to_string();
            let (status, body) =
                send(&app, Method::POST, "/api/v1/chat/feedback", Some(&feedback)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }

        let unknown = json!({ "message_id": uuid::Uuid::new_v4(), "is_helpful": true }).to_string();
        let (status, body) =
            send(&app, Method::POST, "/api/v1/chat/feedback", Some(&unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Message not found");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/chat/feedback",
            Some(r#"{"is_helpful": true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_anonymous_suggestions() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let (status, body) = send(&app, Method::GET, "/api/v1/chat/suggestions", None).await;
        assert_eq!(status, StatusCode::OK);
        let suggestions = body["suggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0], "How does this platform work?");
    }

    #[tokio::test]
    async fn test_anonymous_cannot_post_jobs() {
        let app = build_router(test_state(ScriptedBackend::new()));
        let (status, _) = send(&app, Method::POST, "/api/v1/jobs", Some("{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
