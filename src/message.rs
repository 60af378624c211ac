// src/message.rs
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::services::session_manager::SessionUser;
use crate::validation::{Checker, FieldError, Validate};

/// A client body that can be turned into a backend request.
pub trait ProxyRequest: Validate {
    fn forward_body(&self, user: &SessionUser) -> Value;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn thread_id(&self, user: &SessionUser) -> String {
        let conversation = self
            .conversation_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or("default");
        format!("{}-{}", user.id, conversation)
    }
}

impl Validate for ChatRequest {
    const STRING_FIELDS: &'static [&'static str] = &["message", "conversationId"];

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Checker::new()
            .min_len("message", &self.message, 1, "Message is required")
            .finish()
    }
}

impl ProxyRequest for ChatRequest {
    fn forward_body(&self, user: &SessionUser) -> Value {
        json!({
            "message": self.message,
            "thread_id": self.thread_id(user),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviseGoalRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for ReviseGoalRequest {
    const STRING_FIELDS: &'static [&'static str] = &["title", "description"];

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Checker::new()
            .min_len("title", &self.title, 3, "Title must be at least 3 characters")
            .min_len("description", &self.description, 10, "Description must be at least 10 characters")
            .finish()
    }
}

impl ProxyRequest for ReviseGoalRequest {
    fn forward_body(&self, _user: &SessionUser) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewGoalRequest {
    #[serde(default)]
    pub goal_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_date: Option<String>,
}

/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_target_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Validate for ReviewGoalRequest {
    const STRING_FIELDS: &'static [&'static str] = &["goalId", "title", "description", "targetDate"];

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let date_ok = self
            .target_date
            .as_deref()
            .is_none_or(|raw| parse_target_date(raw).is_some());

        Checker::new()
            .min_len("goalId", &self.goal_id, 1, "Goal ID is required")
            .min_len("title", &self.title, 3, "Title must be at least 3 characters")
            .min_len("description", &self.description, 10, "Description must be at least 10 characters")
            .check("targetDate", date_ok, "Invalid date")
            .finish()
    }
}

impl ProxyRequest for ReviewGoalRequest {
    fn forward_body(&self, _user: &SessionUser) -> Value {
        let target_date = self
            .target_date
            .as_deref()
            .and_then(parse_target_date)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true));

        json!({
            "goal_id": self.goal_id,
            "title": self.title,
            "description": self.description,
            "target_date": target_date,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseUpdateRequest {
    #[serde(default)]
    pub goal_id: String,
    #[serde(default)]
    pub raw_text: String,
}

impl Validate for ParseUpdateRequest {
    const STRING_FIELDS: &'static [&'static str] = &["goalId", "rawText"];

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Checker::new()
            .min_len("goalId", &self.goal_id, 1, "Goal ID is required")
            .min_len("rawText", &self.raw_text, 5, "Update must be at least 5 characters")
            .finish()
    }
}

impl ProxyRequest for ParseUpdateRequest {
    fn forward_body(&self, _user: &SessionUser) -> Value {
        json!({
            "goal_id": self.goal_id,
            "raw_text": self.raw_text,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub is_required: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpertsResponse {
    pub experts: Vec<Expert>,
}
