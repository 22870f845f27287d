use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{request_session_id, SessionQuery};
use crate::errors::AppError;
use crate::services::conversation;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
}

// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message is required".into()));
    }

    // A chat without a session id starts a new session.
    let session_id = payload
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .or_else(|| request_session_id(&query, &headers))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let outcome = conversation::process_message(&state, &session_id, message).await?;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        session_id,
    }))
}
