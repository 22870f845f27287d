use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

// GET /api/clinic/info
pub async fn clinic_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "clinic": state.kb }))
}
