use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};

use crate::{
    error::ApiError,
    message::ChatRequest,
    services::rate_limiter::RateLimitTier,
    state::SharedState,
};

use super::proxy::{Operation, proxy};

pub const CHAT: Operation = Operation {
    name: "chat",
    tier: Some(RateLimitTier::ExpensiveLlm),
    path: "/api/v1/chat",
    forward_user_id: true,
    failure_message: "Failed to process chat request",
};

// The backend answers with a single JSON document; it is relayed as-is.
pub async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    proxy::<ChatRequest>(&state, &headers, &body, &CHAT).await
}
