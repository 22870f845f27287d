use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::{require_session_id, update_session, SessionQuery};
use crate::db::queries;
use crate::errors::AppError;
use crate::services::bookings::{self, BookingEdits};
use crate::state::AppState;

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = require_session_id(&query, &headers)?;
    let session = state.with_db(|db| queries::load_session(db, &session_id))?;

    Ok(Json(serde_json::json!({ "bookings": session.bookings })))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = require_session_id(&query, &headers)?;
    let session = state
        .with_db(|db| queries::get_session(db, &session_id))?
        .ok_or(AppError::NotFound("session"))?;
    let booking = session
        .find_booking(&id)
        .ok_or(AppError::NotFound("booking"))?;

    Ok(Json(serde_json::json!({ "booking": booking })))
}

#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub details: BookingEdits,
}

// PATCH /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = require_session_id(&query, &headers)?;

    let booking = update_session(&state, &session_id, |session| {
        let booking = session
            .find_booking_mut(&id)
            .ok_or(AppError::NotFound("booking"))?;
        bookings::apply_edits(booking, &payload.details, &state.kb)?;
        Ok(booking.clone())
    })
    .await?;

    tracing::info!(session_id = %session_id, booking_id = %id, "booking updated");
    Ok(Json(serde_json::json!({ "ok": true, "booking": booking })))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = require_session_id(&query, &headers)?;

    update_session(&state, &session_id, |session| {
        if session.remove_booking(&id) {
            Ok(())
        } else {
            Err(AppError::NotFound("booking"))
        }
    })
    .await?;

    tracing::info!(session_id = %session_id, booking_id = %id, "booking deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}
