use axum::{Json, extract::State, http::HeaderMap};
use tracing::warn;

use crate::{error::ApiError, services::metrics_manager::MetricsData, state::SharedState};

use super::proxy::require_auth;

pub async fn metrics_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<MetricsData>, ApiError> {
    let ctx = require_auth(&state, &headers, None).await?;
    if !ctx.user.role.is_admin() {
        warn!(user_id = %ctx.user.id, "non-admin asked for metrics");
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.metrics.get_metrics().await))
}
