use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use super::{require_session_id, update_session, SessionQuery};
use crate::errors::AppError;
use crate::state::AppState;

// POST /api/history/clear
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = require_session_id(&query, &headers)?;

    let cleared = update_session(&state, &session_id, |session| {
        let cleared = session.history.len();
        session.history.clear();
        Ok(cleared)
    })
    .await?;

    tracing::info!(session_id = %session_id, cleared, "history cleared");
    Ok(Json(serde_json::json!({ "ok": true })))
}
