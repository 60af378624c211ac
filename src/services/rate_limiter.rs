// src/services/rate_limiter.rs
use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    time::Duration,
};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};
use tracing::warn;

use crate::error::ApiError;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Cost class an operation is throttled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitTier {
    ExpensiveLlm,
    StandardLlm,
}

impl RateLimitTier {
    pub fn id(self) -> &'static str {
        match self {
            RateLimitTier::ExpensiveLlm => "expensive_llm",
            RateLimitTier::StandardLlm => "standard_llm",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RateLimitTier::ExpensiveLlm => "High-cost LLM operations (expert reviews)",
            RateLimitTier::StandardLlm => "Standard LLM operations (validation, extraction)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    pub limit: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (ms) when the oldest counted request leaves the window.
    pub reset: i64,
}

impl RateLimitResult {
    /// Result used when the limiter itself is broken: the request goes through
    /// with a full quota reported.
    pub fn fail_open(policy: TierPolicy) -> Self {
        Self {
            success: true,
            limit: policy.limit,
            remaining: policy.limit,
            reset: Utc::now().timestamp_millis() + policy.window.as_millis() as i64,
        }
    }

    pub fn retry_after_secs(&self) -> u64 {
        let diff = self.reset - Utc::now().timestamp_millis();
        if diff <= 0 { 0 } else { ((diff + 999) / 1000) as u64 }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    fn policy(&self, tier: RateLimitTier) -> TierPolicy;

    /// Counts one request for `key` under `tier` if it fits in the window.
    async fn check(&self, key: &str, tier: RateLimitTier) -> Result<RateLimitResult, RateLimitError>;

    /// Drops bookkeeping that no longer affects any decision.
    async fn purge_expired(&self) -> usize {
        0
    }
}

/// Runs the limiter for a user and turns a rejection into a 429.
/// Limiter failures let the request through.
pub async fn enforce(
    limiter: &dyn RateLimiter,
    user_id: &str,
    tier: RateLimitTier,
) -> Result<RateLimitResult, ApiError> {
    let policy = limiter.policy(tier);

    let result = match limiter.check(user_id, tier).await {
        Ok(result) => result,
        Err(e) => {
            warn!(tier = tier.id(), "rate limiter unavailable, allowing request: {e}");
            return Ok(RateLimitResult::fail_open(policy));
        }
    };

    if result.success {
        return Ok(result);
    }

    warn!(user_id, tier = tier.id(), "rate limit exceeded");
    Err(ApiError::RateLimitExceeded {
        message: format!(
            "Rate limit exceeded. You can make {} {} per {}.",
            policy.limit,
            tier.description(),
            format_window(policy.window)
        ),
        result,
    })
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    let pairs = [
        (LIMIT_HEADER, i64::from(result.limit)),
        (REMAINING_HEADER, i64::from(result.remaining)),
        (RESET_HEADER, result.reset),
    ];
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }
}

pub fn format_window(window: Duration) -> String {
    let secs = window.as_secs();
    let (n, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 { format!("1 {unit}") } else { format!("{n} {unit}s") }
}

/// In-process sliding log keyed by caller and tier.
pub struct SlidingWindowLimiter {
    policies: HashMap<RateLimitTier, TierPolicy>,
    windows: Mutex<HashMap<(String, RateLimitTier), VecDeque<Instant>>>,
}

impl Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("policies", &self.policies)
            .finish()
    }
}

impl SlidingWindowLimiter {
    pub fn new(expensive_llm: TierPolicy, standard_llm: TierPolicy) -> Self {
        let policies = HashMap::from([
            (RateLimitTier::ExpensiveLlm, expensive_llm),
            (RateLimitTier::StandardLlm, standard_llm),
        ]);
        Self { policies, windows: Mutex::new(HashMap::new()) }
    }
}

fn evict_older_than(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = log.front() {
        if now.duration_since(oldest) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    fn policy(&self, tier: RateLimitTier) -> TierPolicy {
        self.policies[&tier]
    }

    async fn check(&self, key: &str, tier: RateLimitTier) -> Result<RateLimitResult, RateLimitError> {
        let policy = self.policy(tier);
        let now = Instant::now();

        let mut windows = self.windows.lock().await;
        let log = windows.entry((key.to_string(), tier)).or_default();
        evict_older_than(log, now, policy.window);

        let success = (log.len() as u32) < policy.limit;
        if success {
            log.push_back(now);
        }

        let remaining = policy.limit.saturating_sub(log.len() as u32);
        let reset_in = log
            .front()
            .map(|&oldest| (oldest + policy.window).saturating_duration_since(now))
            .unwrap_or(policy.window);

        Ok(RateLimitResult {
            success,
            limit: policy.limit,
            remaining,
            reset: Utc::now().timestamp_millis() + reset_in.as_millis() as i64,
        })
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|(_, tier), log| {
            evict_older_than(log, now, self.policies[tier].window);
            !log.is_empty()
        });
        before - windows.len()
    }
}
