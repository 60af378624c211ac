// src/services/auth_client.rs
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{
    HeaderMap,
    header::{AUTHORIZATION, COOKIE},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::session_manager::{SessionError, SessionResolver, SessionUser, session_token};

#[derive(Deserialize)]
struct GetSessionResponse {
    user: SessionUser,
}

/// Asks the auth provider who the caller is by replaying their credentials
/// against its `get-session` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSessionResolver {
    client: Client,
    endpoint: String,
}

impl RemoteSessionResolver {
    pub fn new(auth_url: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{}/api/auth/get-session", auth_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SessionResolver for RemoteSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        if session_token(headers).is_none() {
            return Ok(None);
        }

        let mut request = self.client.get(&self.endpoint);
        for name in [COOKIE, AUTHORIZATION] {
            for value in headers.get_all(&name) {
                request = request.header(name.as_str(), value.as_bytes());
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| SessionError::Unreachable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status if !status.is_success() => {
                return Err(SessionError::UnexpectedStatus(status.as_u16()));
            }
            _ => {}
        }

        // The provider answers `null` when the cookie doesn't map to a session.
        let payload: Option<GetSessionResponse> = response
            .json()
            .await
            .map_err(|e| SessionError::Malformed(e.to_string()))?;

        let user = payload.map(|p| p.user);
        debug!(found = user.is_some(), "resolved session with auth provider");
        Ok(user)
    }
}
