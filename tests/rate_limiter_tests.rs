use std::time::Duration;

use chrono::Utc;
use coach_gateway::error::ApiError;
use coach_gateway::services::rate_limiter::{
    RateLimitTier, RateLimiter, SlidingWindowLimiter, TierPolicy, enforce,
};
use tokio::time::advance;

const HOUR: Duration = Duration::from_secs(3600);

fn limiter(expensive: u32, standard: u32, window: Duration) -> SlidingWindowLimiter {
    SlidingWindowLimiter::new(
        TierPolicy { limit: expensive, window },
        TierPolicy { limit: standard, window },
    )
}

#[tokio::test(start_paused = true)]
async fn counts_down_then_rejects() {
    let limiter = limiter(3, 20, HOUR);

    for expected_remaining in [2, 1, 0] {
        let result = limiter.check("u1", RateLimitTier::ExpensiveLlm).await.unwrap();
        assert!(result.success);
        assert_eq!(result.limit, 3);
        assert_eq!(result.remaining, expected_remaining);
    }

    let result = limiter.check("u1", RateLimitTier::ExpensiveLlm).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.remaining, 0);

    let now_ms = Utc::now().timestamp_millis();
    assert!(result.reset > now_ms);
    assert!(result.reset <= now_ms + HOUR.as_millis() as i64 + 1_000);
}

#[tokio::test(start_paused = true)]
async fn window_slides_instead_of_resetting() {
    let limiter = limiter(2, 20, Duration::from_secs(60));
    let tier = RateLimitTier::ExpensiveLlm;

    assert!(limiter.check("u1", tier).await.unwrap().success); // t=0
    advance(Duration::from_secs(30)).await;
    assert!(limiter.check("u1", tier).await.unwrap().success); // t=30
    advance(Duration::from_secs(15)).await;
    assert!(!limiter.check("u1", tier).await.unwrap().success); // t=45
    advance(Duration::from_secs(16)).await;
    assert!(limiter.check("u1", tier).await.unwrap().success); // t=61, first one left
    advance(Duration::from_secs(9)).await;
    assert!(!limiter.check("u1", tier).await.unwrap().success); // t=70
    advance(Duration::from_secs(21)).await;
    assert!(limiter.check("u1", tier).await.unwrap().success); // t=91
}

#[tokio::test]
async fn rejected_requests_do_not_consume_quota() {
    let limiter = limiter(1, 20, HOUR);
    let tier = RateLimitTier::ExpensiveLlm;

    assert!(limiter.check("u1", tier).await.unwrap().success);
    for _ in 0..5 {
        assert!(!limiter.check("u1", tier).await.unwrap().success);
    }
    assert_eq!(limiter.purge_expired().await, 0);
}

#[tokio::test]
async fn keys_and_tiers_are_isolated() {
    let limiter = limiter(1, 1, HOUR);

    assert!(limiter.check("u1", RateLimitTier::ExpensiveLlm).await.unwrap().success);
    assert!(limiter.check("u1", RateLimitTier::StandardLlm).await.unwrap().success);
    assert!(limiter.check("u2", RateLimitTier::ExpensiveLlm).await.unwrap().success);
    assert!(!limiter.check("u1", RateLimitTier::ExpensiveLlm).await.unwrap().success);
}

#[tokio::test(start_paused = true)]
async fn purge_drops_idle_windows() {
    let limiter = limiter(3, 20, Duration::from_secs(60));
    limiter.check("u1", RateLimitTier::ExpensiveLlm).await.unwrap();
    limiter.check("u2", RateLimitTier::StandardLlm).await.unwrap();

    advance(Duration::from_secs(30)).await;
    limiter.check("u3", RateLimitTier::StandardLlm).await.unwrap();
    assert_eq!(limiter.purge_expired().await, 0);

    advance(Duration::from_secs(31)).await;
    assert_eq!(limiter.purge_expired().await, 2);

    advance(Duration::from_secs(30)).await;
    assert_eq!(limiter.purge_expired().await, 1);
}

#[tokio::test]
async fn enforce_turns_rejection_into_rate_limited_error() {
    let limiter = limiter(1, 20, HOUR);
    let tier = RateLimitTier::ExpensiveLlm;

    let ok = enforce(&limiter, "u1", tier).await.unwrap();
    assert_eq!(ok.remaining, 0);

    match enforce(&limiter, "u1", tier).await {
        Err(ApiError::RateLimitExceeded { message, result }) => {
            assert_eq!(message, "Rate limit exceeded. You can make 1 High-cost LLM operations (expert reviews) per 1 hour.");
            assert!(!result.success);
            assert!(result.retry_after_secs() > 0);
        }
        other => panic!("expected rate limit error, got {other:?}"),
    }
}
