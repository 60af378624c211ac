use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
    time::{MissedTickBehavior, interval},
};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use coach_gateway::{
    config::Config,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::load()?;
    let state: SharedState = Arc::new(AppState::from_config(&config)?);

    tokio::spawn(sweep_expired(state.clone(), config.sweep_interval));

    let mut app = routes::create_router().with_state(state);

    if let Some(origin) = &config.cors_origin {
        let origin: HeaderValue = origin.parse().context("invalid CORS_ORIGIN")?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
                .allow_credentials(true),
        );
    }

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!(backend = %config.backend_url, "coach gateway listening on http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

/// Periodically drops expired sessions and stale rate-limit windows.
async fn sweep_expired(state: SharedState, every: std::time::Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let sessions = state.sessions.purge_expired().await;
        let windows = state.limiter.purge_expired().await;
        debug!(sessions, windows, "swept expired entries");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
