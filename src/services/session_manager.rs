// src/services/session_manager.rs
use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::http::{
    HeaderMap,
    header::{AUTHORIZATION, COOKIE},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "better-auth.session_token";
pub const SECURE_SESSION_COOKIE: &str = "__Secure-better-auth.session_token";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
    Superadmin,
}

/// The auth provider stores roles as free text; anything unrecognised is a
/// plain user.
impl From<Option<String>> for Role {
    fn from(raw: Option<String>) -> Self {
        match raw.map(|r| r.to_ascii_lowercase()).as_deref() {
            Some("moderator") => Role::Moderator,
            Some("admin") => Role::Admin,
            Some("superadmin") => Role::Superadmin,
            _ => Role::User,
        }
    }
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub role: Role,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("auth provider unreachable: {0}")]
    Unreachable(String),
    #[error("auth provider returned {0}")]
    UnexpectedStatus(u16),
    #[error("malformed session payload: {0}")]
    Malformed(String),
}

/// Turns request headers into the caller's identity.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError>;

    async fn purge_expired(&self) -> usize {
        0
    }
}

/// Pulls the session token from the auth cookie, falling back to a bearer token.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE || name == SECURE_SESSION_COOKIE).then(|| value.trim().to_string())
        });

    from_cookie
        .or_else(|| {
            let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
            auth.strip_prefix("Bearer ").map(|token| token.trim().to_string())
        })
        .filter(|token| !token.is_empty())
}

#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
    pub last_active: Instant,
}

impl Session {
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self { token: token.into(), user, last_active: Instant::now() }
    }
}

/// Sessions kept in process memory with an idle timeout.
#[derive(Clone)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issue a fresh session for `user` and return its token.
    pub async fn create_session(&self, user: SessionUser) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session::new(token.clone(), user);

        let mut guard = self.inner.write().await;
        guard.insert(token.clone(), session);
        token
    }

    /// Look up a live session by token and touch `last_active`.
    pub async fn get_user(&self, token: &str) -> Option<SessionUser> {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let session = guard.get_mut(token)?;
        if now.duration_since(session.last_active) >= self.ttl {
            guard.remove(token);
            return None;
        }
        session.last_active = now;
        Some(session.user.clone())
    }

    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionResolver for MemorySessionStore {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        match session_token(headers) {
            Some(token) => Ok(self.get_user(&token).await),
            None => Ok(None),
        }
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }
}
