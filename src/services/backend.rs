// src/services/backend.rs
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Bytes, http::StatusCode};
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Maps a non-2xx answer to the normalized external-service error. The
    /// upstream body is attached only when `expose_details` is set.
    pub fn into_error(self, message: &str, expose_details: bool) -> ApiError {
        let text = String::from_utf8_lossy(&self.body).into_owned();
        error!(status = self.status.as_u16(), "backend error: {text}");

        ApiError::ExternalService {
            message: message.to_string(),
            status: self.status,
            details: expose_details.then(|| json!({ "backend": text })),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request timed out")]
    Timeout,
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        error!("{err}");
        let status = match err {
            BackendError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            BackendError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError::ExternalService {
            message: "Unable to connect to external service".to_string(),
            status,
            details: None,
        }
    }
}

/// The Python service doing the actual LLM work.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn post_json(
        &self,
        path: &str,
        user_id: Option<&str>,
        body: &Value,
    ) -> Result<BackendResponse, BackendError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn post_json(
        &self,
        path: &str,
        user_id: Option<&str>,
        body: &Value,
    ) -> Result<BackendResponse, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(user_id) = user_id {
            request = request.header(USER_ID_HEADER, user_id);
        }

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Unreachable(e.to_string())
            }
        };

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;

        debug!(%url, status = status.as_u16(), bytes = body.len(), "backend responded");
        Ok(BackendResponse { status, body })
    }
}
