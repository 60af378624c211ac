// src/error.rs
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

use crate::services::rate_limiter::{RateLimitResult, apply_rate_limit_headers};
use crate::validation::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    BadRequest,
    InternalError,
    ExternalServiceError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
        }
    }
}

/// JSON envelope shared by every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("{message}")]
    RateLimitExceeded {
        message: String,
        result: RateLimitResult,
    },

    #[error("{message}")]
    ExternalService {
        message: String,
        status: StatusCode,
        details: Option<Value>,
    },

    #[error("An unexpected error occurred")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::Forbidden => ErrorCode::Forbidden,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::ValidationFailed(_) => ErrorCode::ValidationError,
            ApiError::RateLimitExceeded { .. } => ErrorCode::RateLimited,
            ApiError::ExternalService { .. } => ErrorCode::ExternalServiceError,
            ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ExternalService { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        let (details, rate_limit) = match self {
            ApiError::ValidationFailed(fields) => (Some(json!(fields)), None),
            ApiError::RateLimitExceeded { result, .. } => {
                let retry_after = result.retry_after_secs();
                let details = json!({
                    "limit": result.limit,
                    "remaining": result.remaining,
                    "retryAfter": retry_after,
                });
                (Some(details), Some((result, retry_after)))
            }
            ApiError::ExternalService { details, .. } => (details, None),
            ApiError::Internal(err) => {
                error!("unhandled error: {err:#}");
                (None, None)
            }
            _ => (None, None),
        };

        let body = ErrorBody { message, error: code, details };
        let mut response = (status, Json(body)).into_response();

        if let Some((result, retry_after)) = rate_limit {
            let headers = response.headers_mut();
            apply_rate_limit_headers(headers, &result);
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}
