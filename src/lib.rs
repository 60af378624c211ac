//! HTTP gateway for the goal-coaching assistant.
//!
//! Every proxied route runs the same pipeline: resolve the caller's session,
//! charge the caller's rate-limit tier, validate the JSON body, forward a
//! derived request to the Python backend and relay its answer. Failures at any
//! step come back in one JSON envelope (see [`error::ErrorBody`]).
//!
//! Collaborators live in [`state::AppState`] and are built once in `main`;
//! tests swap them for in-memory fakes.

pub mod config;
pub mod error;
pub mod message;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
