// src/config.rs
use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, anyhow, ensure};
use tracing::info;

use crate::services::rate_limiter::TierPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Upstream error bodies are only echoed back outside production.
    pub fn exposes_error_details(self) -> bool {
        self != Environment::Production
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(anyhow!("unknown environment `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub backend_timeout: Option<Duration>,
    pub auth_url: Option<String>,
    pub session_ttl: Duration,
    pub environment: Environment,
    pub cors_origin: Option<String>,
    pub expensive_llm: TierPolicy,
    pub standard_llm: TierPolicy,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let window = Duration::from_secs(try_load(&lookup, "RATE_LIMIT_WINDOW_SECS", "3600")?);
        let timeout_secs: u64 = try_load(&lookup, "BACKEND_TIMEOUT_SECS", "120")?;
        let sweep_secs: u64 = try_load(&lookup, "SWEEP_INTERVAL_SECS", "300")?;
        ensure!(sweep_secs > 0, "SWEEP_INTERVAL_SECS must be greater than zero");

        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            backend_url: try_load::<String, _>(&lookup, "PYTHON_BACKEND_URL", "http://localhost:8000")?
                .trim_end_matches('/')
                .to_string(),
            backend_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            auth_url: optional(&lookup, "AUTH_URL").map(|url| url.trim_end_matches('/').to_string()),
            session_ttl: Duration::from_secs(try_load(&lookup, "SESSION_TTL_SECS", "604800")?),
            environment: try_load(&lookup, "APP_ENV", "production")?,
            cors_origin: optional(&lookup, "CORS_ORIGIN"),
            expensive_llm: TierPolicy {
                limit: try_load(&lookup, "RATE_LIMIT_EXPENSIVE_LLM", "3")?,
                window,
            },
            standard_llm: TierPolicy {
                limit: try_load(&lookup, "RATE_LIMIT_STANDARD_LLM", "20")?,
                window,
            },
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = optional(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value `{raw}`"))
}
