use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bookbot::config::AppConfig;
use bookbot::db::{self, queries};
use bookbot::models::KnowledgeBase;
use bookbot::routes;
use bookbot::services::ai::{LlmProvider, Message};
use bookbot::services::conversation::{self, FALLBACK_REPLY};
use bookbot::state::AppState;

// ── Mock Provider ──

struct MockLlm {
    reply: Option<String>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => anyhow::bail!("model unavailable"),
        }
    }
}

/// Sleeps before answering so concurrent turns overlap.
struct SlowLlm;

#[async_trait]
impl LlmProvider for SlowLlm {
    async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(format!("answer to {}", messages.len()))
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        llm_provider: "openai".to_string(),
        openai_api_key: "".to_string(),
        openai_model: "gpt-4o-mini".to_string(),
        openai_url: "http://localhost:0".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        kb_path: None,
    }
}

fn state_with_llm(reply: Option<&str>) -> (Arc<AppState>, Arc<Mutex<Vec<Vec<Message>>>>) {
    let conn = db::init_db(":memory:").unwrap();
    let calls = Arc::new(Mutex::new(vec![]));
    let llm = MockLlm {
        reply: reply.map(str::to_string),
        calls: Arc::clone(&calls),
    };
    let state = Arc::new(AppState::new(
        conn,
        test_config(),
        KnowledgeBase::default_clinic(),
        Box::new(llm),
    ));
    (state, calls)
}

fn test_state() -> Arc<AppState> {
    state_with_llm(Some("Happy to help!")).0
}

fn test_app(state: Arc<AppState>) -> Router {
    routes::router(state)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn chat_request(session_id: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "session_id": session_id, "message": message }).to_string(),
        ))
        .unwrap()
}

async fn chat(state: &Arc<AppState>, session_id: &str, message: &str) -> String {
    let (status, body) = send(test_app(state.clone()), chat_request(session_id, message)).await;
    assert_eq!(status, StatusCode::OK, "chat failed for {message:?}: {body}");
    body["reply"].as_str().unwrap().to_string()
}

/// Drives a session through to a finalized booking and returns its id.
async fn book_physiotherapy(state: &Arc<AppState>, session_id: &str) -> String {
    for message in [
        "physiotherapy",
        "yes",
        "2026-03-02",
        "yes",
        "2pm",
        "yes",
        "raffles place",
        "yes",
        "Ann Tan, ann@example.com",
    ] {
        chat(state, session_id, message).await;
    }
    let prompt = chat(state, session_id, "yes").await;
    assert!(prompt.starts_with("Please confirm your booking details"));

    let reply = chat(state, session_id, "confirm").await;
    let id = reply
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Your booking is confirmed. Booking ID: "))
        .unwrap_or_else(|| panic!("unexpected reply: {reply}"));
    id.to_string()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ── Health Check ──

#[tokio::test]
async fn test_health() {
    let (status, body) = send(test_app(test_state()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ── Chat ──

#[tokio::test]
async fn test_chat_implicit_service_then_yes() {
    let state = test_state();

    let reply = chat(&state, "s1", "I want a dental cleaning").await;
    assert_eq!(reply, "Did you want to book **Dental Cleaning**? (yes/no)");

    let reply = chat(&state, "s1", "yes").await;
    assert!(reply.starts_with("What date would you like?"), "got: {reply}");

    let session = state
        .with_db(|db| queries::load_session(db, "s1"))
        .unwrap();
    assert_eq!(session.draft.get(bookbot::models::Field::Service), Some("Dental Cleaning"));
}

#[tokio::test]
async fn test_chat_requires_message() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"session_id":"s1","message":"   "}"#))
        .unwrap();
    let (status, body) = send(test_app(test_state()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message is required");
}

#[tokio::test]
async fn test_chat_mints_session_id() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"message":"book an appointment"}"#))
        .unwrap();
    let (status, body) = send(test_app(test_state()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["session_id"].as_str().unwrap().is_empty());
    assert!(body["reply"]
        .as_str()
        .unwrap()
        .starts_with("What service would you like to book?"));
}

#[tokio::test]
async fn test_chat_session_id_from_header() {
    let state = test_state();
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .header("X-Session-Id", "from-header")
        .body(Body::from(r#"{"message":"book an appointment"}"#))
        .unwrap();
    let (status, body) = send(test_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "from-header");

    let stored = state
        .with_db(|db| queries::get_session(db, "from-header"))
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_free_chat_uses_llm_and_records_history() {
    let (state, calls) = state_with_llm(Some("  We open at 9.  "));

    let reply = chat(&state, "s1", "tell me a joke").await;
    assert_eq!(reply, "We open at 9.");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let payload: Value = serde_json::from_str(&calls[0][0].content).unwrap();
    assert_eq!(payload["user_message"], "tell me a joke");
    assert_eq!(payload["clinic_kb"]["clinic_name"], "BookBot Clinic");

    let session = state
        .with_db(|db| queries::load_session(db, "s1"))
        .unwrap();
    assert_eq!(session.history.len(), 1);
    assert_eq!(session.history[0].user, "tell me a joke");
    assert_eq!(session.history[0].assistant, "We open at 9.");
}

#[tokio::test]
async fn test_free_chat_failure_returns_fallback() {
    let (state, _) = state_with_llm(None);

    let reply = chat(&state, "s1", "tell me a joke").await;
    assert_eq!(reply, FALLBACK_REPLY);

    let session = state
        .with_db(|db| queries::load_session(db, "s1"))
        .unwrap();
    assert!(session.history.is_empty());
}

#[tokio::test]
async fn test_booking_flow_does_not_call_llm() {
    let (state, calls) = state_with_llm(Some("unused"));
    book_physiotherapy(&state, "s1").await;
    assert!(calls.lock().unwrap().is_empty());
}

// ── Bookings API ──

#[tokio::test]
async fn test_bookings_require_session_id() {
    let (status, body) = send(test_app(test_state()), get("/api/bookings")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "session_id is required");
}

#[tokio::test]
async fn test_bookings_empty_for_new_session() {
    let (status, body) = send(test_app(test_state()), get("/api/bookings?session_id=nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookings"], json!([]));
}

#[tokio::test]
async fn test_booking_list_get_patch_delete() {
    let state = test_state();
    let id = book_physiotherapy(&state, "s1").await;

    let (status, body) = send(test_app(state.clone()), get("/api/bookings?session_id=s1")).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["id"], id.as_str());
    assert_eq!(bookings[0]["status"], "booked");
    assert_eq!(bookings[0]["details"]["service"], "Physiotherapy");

    let req = Request::builder()
        .uri(format!("/api/bookings/{id}"))
        .header("X-Session-Id", "s1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["details"]["location"], "Raffles Place");

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/bookings/{id}?session_id=s1"))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "details": { "service": "vaccination", "time": "4:30 PM" } }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(test_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["booking"]["id"], id.as_str());
    assert_eq!(body["booking"]["details"]["service"], "Vaccination");
    assert_eq!(body["booking"]["details"]["time"], "4:30 PM");

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/bookings/{id}?session_id=s1"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = send(
        test_app(state.clone()),
        get(&format!("/api/bookings/{id}?session_id=s1")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "booking not found");
}

#[tokio::test]
async fn test_invalid_patch_is_rejected_unchanged() {
    let state = test_state();
    let id = book_physiotherapy(&state, "s1").await;

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/bookings/{id}?session_id=s1"))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "details": { "service": "Brain Surgery", "contact": "Bob" } }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(test_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid service");

    let session = state
        .with_db(|db| queries::load_session(db, "s1"))
        .unwrap();
    let booking = session.find_booking(&id).unwrap();
    assert_eq!(
        booking.details.get(&bookbot::models::Field::Contact).map(String::as_str),
        Some("Ann Tan, ann@example.com")
    );
}

#[tokio::test]
async fn test_booking_unknown_session_and_id() {
    let state = test_state();

    let (status, body) = send(
        test_app(state.clone()),
        get("/api/bookings/missing?session_id=ghost"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session not found");

    chat(&state, "s1", "book an appointment").await;
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/bookings/missing?session_id=s1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "booking not found");
}

// ── Clinic & History ──

#[tokio::test]
async fn test_clinic_info() {
    let (status, body) = send(test_app(test_state()), get("/api/clinic/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clinic"]["clinic_name"], "BookBot Clinic");
    assert_eq!(body["clinic"]["services"][3]["price_sgd"], 40);
}

#[tokio::test]
async fn test_clear_history() {
    let state = test_state();
    chat(&state, "s1", "tell me a joke").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/history/clear?session_id=s1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let session = state
        .with_db(|db| queries::load_session(db, "s1"))
        .unwrap();
    assert!(session.history.is_empty());
}

#[tokio::test]
async fn test_clear_history_unknown_session() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/history/clear")
        .header("X-Session-Id", "ghost")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(test_state()), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session not found");
}

// ── Concurrency ──

#[tokio::test]
async fn test_concurrent_turns_on_one_session_keep_every_write() {
    let conn = db::init_db(":memory:").unwrap();
    let state = Arc::new(AppState::new(
        conn,
        test_config(),
        KnowledgeBase::default_clinic(),
        Box::new(SlowLlm),
    ));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                conversation::process_message(&state, "shared", &format!("tell me joke {i}")).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let session = state
        .with_db(|db| queries::load_session(db, "shared"))
        .unwrap();
    assert_eq!(session.history.len(), 5);
}
