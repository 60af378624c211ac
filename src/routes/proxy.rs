// src/routes/proxy.rs
use axum::{
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::{
    error::ApiError,
    message::ProxyRequest,
    services::{
        backend::BackendResponse,
        rate_limiter::{RateLimitResult, RateLimitTier, apply_rate_limit_headers, enforce},
        session_manager::SessionUser,
    },
    state::AppState,
    validation::parse_body,
};

/// Static description of one proxied route.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    /// Label used in logs and metrics.
    pub name: &'static str,
    pub tier: Option<RateLimitTier>,
    /// Backend path, appended to the configured base URL.
    pub path: &'static str,
    /// Whether the backend gets the caller id as `X-User-Id`.
    pub forward_user_id: bool,
    /// Message for the error returned when the backend answers non-2xx.
    pub failure_message: &'static str,
}

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: SessionUser,
    pub rate_limit: Option<RateLimitResult>,
}

pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<SessionUser, ApiError> {
    match state.sessions.resolve(headers).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(e) => {
            error!("session lookup failed: {e}");
            Err(ApiError::ExternalService {
                message: "Unable to verify session".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                details: None,
            })
        }
    }
}

/// Session check followed by the optional rate-limit check.
pub async fn require_auth(
    state: &AppState,
    headers: &HeaderMap,
    tier: Option<RateLimitTier>,
) -> Result<AuthContext, ApiError> {
    let user = authenticate(state, headers).await?;
    let rate_limit = match tier {
        Some(tier) => Some(enforce(state.limiter.as_ref(), &user.id, tier).await?),
        None => None,
    };
    Ok(AuthContext { user, rate_limit })
}

/// Upstream status and bytes go back untouched, plus rate-limit headers.
pub fn relay(upstream: BackendResponse, rate_limit: Option<&RateLimitResult>) -> Response {
    let mut response = (
        upstream.status,
        [(CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response();

    if let Some(result) = rate_limit {
        apply_rate_limit_headers(response.headers_mut(), result);
    }
    response
}

/// Full authenticated-proxy pipeline for one request.
pub async fn proxy<T>(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    op: &Operation,
) -> Result<Response, ApiError>
where
    T: ProxyRequest + DeserializeOwned,
{
    let outcome = forward::<T>(state, headers, body, op).await;
    let label = match &outcome {
        Ok(_) => "OK",
        Err(e) => e.code().as_str(),
    };
    state.metrics.record(op.name, label).await;
    outcome
}

async fn forward<T>(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    op: &Operation,
) -> Result<Response, ApiError>
where
    T: ProxyRequest + DeserializeOwned,
{
    let ctx = require_auth(state, headers, op.tier).await?;
    let request: T = parse_body(body)?;

    let payload = request.forward_body(&ctx.user);
    let user_id = op.forward_user_id.then_some(ctx.user.id.as_str());

    info!(operation = op.name, user_id = %ctx.user.id, "forwarding to backend");
    let upstream = state.backend.post_json(op.path, user_id, &payload).await?;

    if !upstream.is_success() {
        return Err(upstream.into_error(op.failure_message, state.environment.exposes_error_details()));
    }

    Ok(relay(upstream, ctx.rate_limit.as_ref()))
}
