use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use coach_gateway::services::session_manager::{
    MemorySessionStore, Role, SECURE_SESSION_COOKIE, SessionResolver, SessionUser,
};
use std::time::Duration;
use tokio::time::advance;

fn cookie(name: &str, token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(&format!("{name}={token}")).unwrap());
    headers
}

#[tokio::test]
async fn resolves_user_from_cookie() {
    let store = MemorySessionStore::new(Duration::from_secs(60));
    let token = store.create_session(SessionUser::new("u1", Role::Moderator)).await;

    let user = store
        .resolve(&cookie("better-auth.session_token", &token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user, SessionUser::new("u1", Role::Moderator));

    let user = store.resolve(&cookie(SECURE_SESSION_COOKIE, &token)).await.unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn missing_or_unknown_token_resolves_to_none() {
    let store = MemorySessionStore::new(Duration::from_secs(60));
    store.create_session(SessionUser::new("u1", Role::User)).await;

    assert!(store.resolve(&HeaderMap::new()).await.unwrap().is_none());
    assert!(
        store
            .resolve(&cookie("better-auth.session_token", "forged"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test(start_paused = true)]
async fn test_session_expiration() {
    let store = MemorySessionStore::new(Duration::from_secs(10));
    let stale = store.create_session(SessionUser::new("u1", Role::User)).await;

    advance(Duration::from_secs(11)).await;
    let fresh = store.create_session(SessionUser::new("u2", Role::User)).await;

    let removed_count = store.purge_expired().await;
    assert_eq!(removed_count, 1, "Should have removed 1 expired session");
    assert!(store.get_user(&stale).await.is_none());
    assert!(store.get_user(&fresh).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn activity_keeps_a_session_alive() {
    let store = MemorySessionStore::new(Duration::from_secs(10));
    let token = store.create_session(SessionUser::new("u1", Role::User)).await;

    for _ in 0..3 {
        advance(Duration::from_secs(8)).await;
        assert!(store.get_user(&token).await.is_some());
    }

    advance(Duration::from_secs(10)).await;
    assert!(store.get_user(&token).await.is_none());
    assert!(store.is_empty().await);
}
