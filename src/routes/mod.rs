// src/routes/mod.rs
pub mod admin;
pub mod chat;
pub mod goals;
pub mod proxy;
pub mod updates;

use crate::{error::ApiError, message::HealthResponse, state::SharedState};
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use tower_http::trace::TraceLayer;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/api", get(health_handler))
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/goals/revise", post(goals::revise_handler))
        .route("/api/goals/review", post(goals::review_handler))
        .route("/api/goals/experts", get(goals::experts_handler))
        .route("/api/updates/parse", post(updates::parse_update_handler))
        .route("/api/admin/metrics", get(admin::metrics_handler))
        .fallback(|| async { ApiError::NotFound("Route") })
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
