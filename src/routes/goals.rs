use axum::{Json, body::Bytes, extract::State, http::HeaderMap, response::Response};

use crate::{
    error::ApiError,
    message::{Expert, ExpertsResponse, ReviewGoalRequest, ReviseGoalRequest},
    services::rate_limiter::RateLimitTier,
    state::SharedState,
};

use super::proxy::{Operation, proxy, require_auth};

pub const REVISE: Operation = Operation {
    name: "goals.revise",
    tier: Some(RateLimitTier::StandardLlm),
    path: "/api/v1/goals/revise",
    forward_user_id: false,
    failure_message: "Failed to revise goal",
};

pub const REVIEW: Operation = Operation {
    name: "goals.review",
    tier: Some(RateLimitTier::ExpensiveLlm),
    path: "/api/v1/goals/review",
    forward_user_id: false,
    failure_message: "Failed to get expert review",
};

// (id, name, description, icon, required)
const EXPERTS: [(&str, &str, &str, &str, bool); 8] = [
    ("progress_tracker", "Progress Tracker", "Defines metrics and estimates daily/weekly progress targets", "chart-line", true),
    ("motivator", "Motivation Coach", "Provides psychological strategies and encouragement", "heart-handshake", false),
    ("strategist", "Strategic Planner", "Creates action plans and prioritization strategies", "chess", false),
    ("accountability", "Accountability Partner", "Designs check-in structures and commitment devices", "users", false),
    ("obstacle_analyst", "Obstacle Analyst", "Identifies potential blockers and mitigation strategies", "shield-check", false),
    ("time_optimizer", "Time Optimizer", "Provides scheduling and time management advice", "clock", false),
    ("skill_advisor", "Skills Advisor", "Analyzes skills gaps and recommends learning resources", "book", false),
    ("wellness_guide", "Wellness Guide", "Focuses on work-life balance and burnout prevention", "leaf", false),
];

pub fn expert_catalog() -> Vec<Expert> {
    EXPERTS
        .iter()
        .map(|&(id, name, description, icon, is_required)| Expert {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            is_required,
        })
        .collect()
}

pub async fn revise_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    proxy::<ReviseGoalRequest>(&state, &headers, &body, &REVISE).await
}

pub async fn review_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    proxy::<ReviewGoalRequest>(&state, &headers, &body, &REVIEW).await
}

pub async fn experts_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ExpertsResponse>, ApiError> {
    require_auth(&state, &headers, None).await?;
    Ok(Json(ExpertsResponse { experts: expert_catalog() }))
}
