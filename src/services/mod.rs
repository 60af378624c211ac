pub mod auth_client;
pub mod backend;
pub mod metrics_manager;
pub mod rate_limiter;
pub mod session_manager;
