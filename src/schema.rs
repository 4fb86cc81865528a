//! Strict parsing of inbound payloads.
//!
//! Every check reports the first violated field only. Unknown keys are
//! checked before the declared fields, and declared fields in declaration
//! order, so the reported field is deterministic for a given body.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{ContentBody, NewTask, TaskPatch};
use crate::utils::parse_date;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const TASK_CREATE_FIELDS: &[&str] = &["date", "content", "completed"];
const TASK_UPDATE_FIELDS: &[&str] = &["date", "content", "completed"];
const CONTENT_FIELDS: &[&str] = &["content"];

/// Decode a raw request body into a JSON object.
pub fn parse_body(body: &[u8]) -> Result<Value, ValidationError> {
    if body.is_empty() {
        return Err(ValidationError::new("body", "Request body is required"));
    }
    serde_json::from_slice(body)
        .map_err(|e| ValidationError::new("body", format!("Malformed JSON: {e}")))
}

pub fn validate_new_task(value: &Value) -> Result<NewTask, ValidationError> {
    let object = strict_object(value, TASK_CREATE_FIELDS)?;
    let date = required_string(object, "date")?;
    validate_date("date", date)?;
    let content = required_content(object)?;
    let completed = optional_bool(object, "completed")?.unwrap_or(false);
    Ok(NewTask {
        date: date.to_string(),
        content,
        completed,
    })
}

pub fn validate_task_patch(value: &Value) -> Result<TaskPatch, ValidationError> {
    let object = strict_object(value, TASK_UPDATE_FIELDS)?;
    let date = optional_string(object, "date")?;
    if let Some(date) = date {
        validate_date("date", date)?;
    }
    let content = match optional_string(object, "content")? {
        Some(content) => Some(non_empty_content(content)?),
        None => None,
    };
    let patch = TaskPatch {
        date: date.map(str::to_string),
        content,
        completed: optional_bool(object, "completed")?,
    };
    if patch.is_empty() {
        return Err(ValidationError::new(
            "body",
            "At least one of date, content or completed is required",
        ));
    }
    Ok(patch)
}

/// Rule create, note upsert and month goal upsert all take `{content}`.
pub fn validate_content_body(value: &Value) -> Result<ContentBody, ValidationError> {
    let object = strict_object(value, CONTENT_FIELDS)?;
    Ok(ContentBody {
        content: required_content(object)?,
    })
}

/// A calendar day in fixed-width `YYYY-MM-DD` form.
pub fn validate_date(field: &str, value: &str) -> Result<(), ValidationError> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped || parse_date(value).is_err() {
        return Err(ValidationError::new(
            field,
            format!("Invalid date '{value}', expected YYYY-MM-DD"),
        ));
    }
    Ok(())
}

/// A calendar month in fixed-width `YYYY-MM` form.
pub fn validate_month(field: &str, value: &str) -> Result<(), ValidationError> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit());
    if !shaped || parse_date(&format!("{value}-01")).is_err() {
        return Err(ValidationError::new(
            field,
            format!("Invalid month '{value}', expected YYYY-MM"),
        ));
    }
    Ok(())
}

fn strict_object<'a>(
    value: &'a Value,
    allowed: &[&str],
) -> Result<&'a Map<String, Value>, ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::new("body", "Expected a JSON object"))?;
    if let Some(unknown) = object.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ValidationError::new(
            unknown.as_str(),
            format!("Unrecognized key: '{unknown}'"),
        ));
    }
    Ok(object)
}

fn required_string<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a str, ValidationError> {
    optional_string(object, field)?.ok_or_else(|| ValidationError::new(field, "Required"))
}

fn optional_string<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ValidationError::new(
            field,
            format!("Expected string, received {}", type_name(other)),
        )),
    }
}

fn optional_bool(
    object: &Map<String, Value>,
    field: &str,
) -> Result<Option<bool>, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ValidationError::new(
            field,
            format!("Expected boolean, received {}", type_name(other)),
        )),
    }
}

fn required_content(object: &Map<String, Value>) -> Result<String, ValidationError> {
    non_empty_content(required_string(object, "content")?)
}

fn non_empty_content(content: &str) -> Result<String, ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::new("content", "Content cannot be empty"));
    }
    Ok(content.to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_task_defaults_completed_to_false() {
        let task =
            validate_new_task(&json!({"date": "2026-03-10", "content": "Write report"})).unwrap();
        assert_eq!(task.date, "2026-03-10");
        assert_eq!(task.content, "Write report");
        assert!(!task.completed);
    }

    #[test]
    fn empty_content_reports_content_field() {
        let err = validate_new_task(&json!({"date": "2026-03-10", "content": "   "})).unwrap_err();
        assert_eq!(err.field, "content");

        let err = validate_new_task(&json!({"date": "2026-03-10"})).unwrap_err();
        assert_eq!(err.field, "content");
        assert_eq!(err.message, "Required");
    }

    #[test]
    fn server_generated_fields_are_rejected() {
        for key in ["id", "userId", "createdAt"] {
            let mut body = json!({"date": "2026-03-10", "content": "x"});
            body[key] = json!("smuggled");
            let err = validate_new_task(&body).unwrap_err();
            assert_eq!(err.field, key);
            assert!(err.message.contains("Unrecognized key"));
        }
    }

    #[test]
    fn unknown_keys_are_reported_before_field_errors() {
        let err = validate_new_task(&json!({"content": "", "extra": 1})).unwrap_err();
        assert_eq!(err.field, "extra");
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in ["2026-3-10", "2026-02-30", "10-03-2026", "2026/03/10", "", "2026-03-10T00:00"] {
            let err = validate_date("date", bad).unwrap_err();
            assert_eq!(err.field, "date", "accepted {bad:?}");
        }
        assert!(validate_date("date", "2028-02-29").is_ok());
    }

    #[test]
    fn months_must_be_fixed_width_and_real() {
        assert!(validate_month("month", "2026-03").is_ok());
        for bad in ["2026-3", "2026-13", "2026-00", "202603", "2026-03-01"] {
            assert!(validate_month("month", bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn wrong_types_name_the_field() {
        let err =
            validate_new_task(&json!({"date": "2026-03-10", "content": "x", "completed": "yes"}))
                .unwrap_err();
        assert_eq!(err.field, "completed");
        assert_eq!(err.message, "Expected boolean, received string");

        let err = validate_content_body(&json!({"content": 5})).unwrap_err();
        assert_eq!(err.field, "content");
    }

    #[test]
    fn patch_requires_at_least_one_field() {
        let err = validate_task_patch(&json!({})).unwrap_err();
        assert_eq!(err.field, "body");

        let patch = validate_task_patch(&json!({"completed": true})).unwrap();
        assert_eq!(patch.completed, Some(true));
        assert!(patch.content.is_none());
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert_eq!(parse_body(b"").unwrap_err().field, "body");
        assert_eq!(parse_body(b"{not json").unwrap_err().field, "body");
        let value = parse_body(b"[1,2]").unwrap();
        assert_eq!(validate_content_body(&value).unwrap_err().field, "body");
    }
}
