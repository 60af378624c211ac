// src/state.rs
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{Config, Environment};
use crate::services::auth_client::RemoteSessionResolver;
use crate::services::backend::{Backend, HttpBackend};
use crate::services::metrics_manager::MetricsManager;
use crate::services::rate_limiter::{RateLimiter, SlidingWindowLimiter};
use crate::services::session_manager::{MemorySessionStore, SessionResolver};

pub type SharedState = Arc<AppState>;

/// Everything a handler needs, built once at startup.
pub struct AppState {
    pub sessions: Arc<dyn SessionResolver>,
    pub limiter: Arc<dyn RateLimiter>,
    pub backend: Arc<dyn Backend>,
    pub metrics: MetricsManager,
    pub environment: Environment,
}

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionResolver>,
        limiter: Arc<dyn RateLimiter>,
        backend: Arc<dyn Backend>,
        environment: Environment,
    ) -> Self {
        Self {
            sessions,
            limiter,
            backend,
            metrics: MetricsManager::new(),
            environment,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let sessions: Arc<dyn SessionResolver> = match &config.auth_url {
            Some(url) => {
                info!("Resolving sessions against auth provider at {url}");
                Arc::new(
                    RemoteSessionResolver::new(url, config.backend_timeout)
                        .context("failed to build auth provider client")?,
                )
            }
            None => {
                info!("AUTH_URL not set, using in-memory sessions");
                Arc::new(MemorySessionStore::new(config.session_ttl))
            }
        };

        let backend = HttpBackend::new(&config.backend_url, config.backend_timeout)
            .context("failed to build backend client")?;

        Ok(Self::new(
            sessions,
            Arc::new(SlidingWindowLimiter::new(config.expensive_llm, config.standard_llm)),
            Arc::new(backend),
            config.environment,
        ))
    }
}
