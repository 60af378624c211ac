#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;

use coach_gateway::config::Environment;
use coach_gateway::routes::create_router;
use coach_gateway::services::backend::{Backend, BackendError, BackendResponse};
use coach_gateway::services::rate_limiter::{
    RateLimitError, RateLimitResult, RateLimitTier, RateLimiter, SlidingWindowLimiter, TierPolicy,
};
use coach_gateway::services::session_manager::{MemorySessionStore, Role, SessionUser};
use coach_gateway::state::{AppState, SharedState};

pub const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub user_id: Option<String>,
    pub body: Value,
}

pub enum Reply {
    Respond(StatusCode, String),
    Timeout,
    Unreachable,
}

/// Backend double that records every call and answers with a canned reply.
pub struct FakeBackend {
    calls: Mutex<Vec<RecordedCall>>,
    reply: Mutex<Reply>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(Reply::Respond(StatusCode::OK, r#"{"ok":true}"#.to_string())),
        }
    }

    pub fn reply_with(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn post_json(
        &self,
        path: &str,
        user_id: Option<&str>,
        body: &Value,
    ) -> Result<BackendResponse, BackendError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            user_id: user_id.map(str::to_string),
            body: body.clone(),
        });

        match &*self.reply.lock().unwrap() {
            Reply::Respond(status, body) => Ok(BackendResponse {
                status: *status,
                body: Bytes::from(body.clone()),
            }),
            Reply::Timeout => Err(BackendError::Timeout),
            Reply::Unreachable => Err(BackendError::Unreachable("connection refused".into())),
        }
    }
}

/// Limiter whose store is always down.
pub struct BrokenLimiter;

#[async_trait]
impl RateLimiter for BrokenLimiter {
    fn policy(&self, _tier: RateLimitTier) -> TierPolicy {
        TierPolicy { limit: 3, window: HOUR }
    }

    async fn check(&self, _key: &str, _tier: RateLimitTier) -> Result<RateLimitResult, RateLimitError> {
        Err(RateLimitError::Unavailable("redis down".into()))
    }
}

pub struct Harness {
    pub app: Router,
    pub state: SharedState,
    pub sessions: Arc<MemorySessionStore>,
    pub backend: Arc<FakeBackend>,
}

impl Harness {
    pub fn new(environment: Environment) -> Self {
        let limiter = SlidingWindowLimiter::new(
            TierPolicy { limit: 3, window: HOUR },
            TierPolicy { limit: 20, window: HOUR },
        );
        Self::with_limiter(environment, Arc::new(limiter))
    }

    pub fn with_limiter(environment: Environment, limiter: Arc<dyn RateLimiter>) -> Self {
        let sessions = Arc::new(MemorySessionStore::new(HOUR));
        let backend = Arc::new(FakeBackend::new());
        let state = Arc::new(AppState::new(
            sessions.clone(),
            limiter,
            backend.clone(),
            environment,
        ));
        let app = create_router().with_state(state.clone());
        Self { app, state, sessions, backend }
    }

    pub async fn login(&self, id: &str, role: Role) -> String {
        self.sessions.create_session(SessionUser::new(id, role)).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::util::ServiceExt;
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub fn post(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("cookie", format!("better-auth.session_token={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("cookie", format!("better-auth.session_token={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
