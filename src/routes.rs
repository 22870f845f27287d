use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-session-id")]);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/api/bookings/:id",
            get(handlers::bookings::get_booking)
                .patch(handlers::bookings::update_booking)
                .delete(handlers::bookings::delete_booking),
        )
        .route("/api/clinic/info", get(handlers::clinic::clinic_info))
        .route("/api/history/clear", post(handlers::history::clear_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
