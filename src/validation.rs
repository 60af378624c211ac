// src/validation.rs
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Schema check run after a body deserializes.
pub trait Validate {
    /// Body keys that must hold a JSON string when present, in report order.
    const STRING_FIELDS: &'static [&'static str] = &[];

    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Accumulates field errors so a single response can report all of them.
#[derive(Debug, Default)]
pub struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least `min` characters, counted as scalar values and untrimmed.
    pub fn min_len(&mut self, path: &str, value: &str, min: usize, message: &str) -> &mut Self {
        self.check(path, value.chars().count() >= min, message)
    }

    pub fn check(&mut self, path: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(path, message));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// Parses a raw request body into `T` and runs its schema.
pub fn parse_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("Request body must be valid JSON".to_string()))?;

    let Value::Object(mut object) = value else {
        return Err(ApiError::ValidationFailed(vec![FieldError::new("", "Expected an object")]));
    };

    // Mistyped fields are reported and dropped so the rest still get checked.
    let mut errors = take_mistyped(&mut object, T::STRING_FIELDS);

    let parsed: T = serde_json::from_value(Value::Object(object))
        .map_err(|e| ApiError::ValidationFailed(vec![FieldError::new("", e.to_string())]))?;

    if let Err(field_errors) = parsed.validate() {
        let field_errors: Vec<_> = field_errors
            .into_iter()
            .filter(|f| !errors.iter().any(|e| e.path == f.path))
            .collect();
        errors.extend(field_errors);
    }

    if errors.is_empty() {
        return Ok(parsed);
    }

    errors.sort_by_key(|f| {
        T::STRING_FIELDS
            .iter()
            .position(|&name| name == f.path)
            .unwrap_or(usize::MAX)
    });
    Err(ApiError::ValidationFailed(errors))
}

fn take_mistyped(object: &mut Map<String, Value>, fields: &[&str]) -> Vec<FieldError> {
    fields
        .iter()
        .filter_map(|&name| {
            let kind = json_kind(object.get(name)?)?;
            object.remove(name);
            Some(FieldError::new(name, format!("Expected string, received {kind}")))
        })
        .collect()
}

/// JSON type name of anything that isn't a string.
fn json_kind(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(_) => None,
        Value::Null => Some("null"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(_) => Some("number"),
        Value::Array(_) => Some("array"),
        Value::Object(_) => Some("object"),
    }
}
