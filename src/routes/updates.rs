use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};

use crate::{
    error::ApiError,
    message::ParseUpdateRequest,
    services::rate_limiter::RateLimitTier,
    state::SharedState,
};

use super::proxy::{Operation, proxy};

pub const PARSE_UPDATE: Operation = Operation {
    name: "updates.parse",
    tier: Some(RateLimitTier::StandardLlm),
    path: "/api/v1/updates/parse",
    forward_user_id: false,
    failure_message: "Failed to parse update",
};

pub async fn parse_update_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    proxy::<ParseUpdateRequest>(&state, &headers, &body, &PARSE_UPDATE).await
}
