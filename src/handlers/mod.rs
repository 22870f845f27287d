pub mod bookings;
pub mod chat;
pub mod clinic;
pub mod health;
pub mod history;

use std::sync::Arc;

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Session;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// Session id from the `session_id` query parameter or the `X-Session-Id`
/// header, in that order.
pub fn request_session_id(query: &SessionQuery, headers: &HeaderMap) -> Option<String> {
    query
        .session_id
        .clone()
        .or_else(|| {
            headers
                .get("x-session-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

pub fn require_session_id(query: &SessionQuery, headers: &HeaderMap) -> Result<String, AppError> {
    request_session_id(query, headers).ok_or_else(|| AppError::BadRequest("session_id is required".into()))
}

/// Runs `f` against an existing session under its lock and saves the result
/// if `f` succeeds.
pub async fn update_session<T>(
    state: &Arc<AppState>,
    session_id: &str,
    f: impl FnOnce(&mut Session) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let lock = state.session_lock(session_id)?;
    let _guard = lock.lock().await;

    let mut session = state
        .with_db(|db| queries::get_session(db, session_id))?
        .ok_or(AppError::NotFound("session"))?;
    let out = f(&mut session)?;
    state.with_db(|db| queries::save_session(db, session_id, &session))?;
    Ok(out)
}
