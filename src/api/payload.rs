//! Request payload validation for the todo resource.
//!
//! Bodies are read as raw JSON so that missing, null and wrongly typed fields
//! can each be reported per field.

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::database::models::TodoChanges;
use crate::database::schema::TITLE_MAX_LENGTH;
use crate::error::ApiError;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_STRING: &str = "Not a valid string.";
const NOT_BOOLEAN: &str = "Must be a valid boolean.";

/// Which fields must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// `title` and `description`; `completed` is not accepted
    Create,
    /// `title`, `description` and `completed`
    Replace,
    /// any subset of the mutable fields
    Partial,
}

/// Unwrap an axum JSON extraction. Bodies over the configured size limit
/// are 413; every other failure is a validation error.
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::payload_too_large(rejection.body_text()))
        }
        Err(rejection) => Err(ApiError::validation_error(rejection.body_text(), None)),
    }
}

pub fn parse_todo_payload(body: &Value, mode: PayloadMode) -> Result<TodoChanges, ApiError> {
    let Some(map) = body.as_object() else {
        return Err(ApiError::validation_error(
            "Invalid data. Expected a JSON object.",
            None,
        ));
    };

    let required = mode != PayloadMode::Partial;
    let mut errors = BTreeMap::new();

    let title = collect(&mut errors, "title", text_field(map, "title", required, Some(TITLE_MAX_LENGTH)));
    let description = collect(&mut errors, "description", text_field(map, "description", required, None));
    let completed = match mode {
        PayloadMode::Create => None,
        PayloadMode::Replace => collect(&mut errors, "completed", bool_field(map, "completed", true)),
        PayloadMode::Partial => collect(&mut errors, "completed", bool_field(map, "completed", false)),
    };

    if !errors.is_empty() {
        return Err(ApiError::validation_error("Invalid input", Some(errors)));
    }

    Ok(TodoChanges {
        title,
        description,
        completed,
        is_deleted: None,
    })
}

fn collect<T>(
    errors: &mut BTreeMap<String, String>,
    name: &str,
    result: Result<Option<T>, String>,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(message) => {
            errors.insert(name.to_string(), message);
            None
        }
    }
}

fn text_field(
    map: &Map<String, Value>,
    name: &str,
    required: bool,
    max_length: Option<u32>,
) -> Result<Option<String>, String> {
    match map.get(name) {
        None if required => Err(REQUIRED.to_string()),
        None => Ok(None),
        Some(Value::Null) => Err(NOT_NULL.to_string()),
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                return Err(NOT_BLANK.to_string());
            }
            if let Some(max) = max_length {
                if s.chars().count() > max as usize {
                    return Err(format!("Ensure this field has no more than {} characters.", max));
                }
            }
            Ok(Some(s.clone()))
        }
        Some(_) => Err(NOT_STRING.to_string()),
    }
}

fn bool_field(map: &Map<String, Value>, name: &str, required: bool) -> Result<Option<bool>, String> {
    match map.get(name) {
        None if required => Err(REQUIRED.to_string()),
        None => Ok(None),
        Some(Value::Null) => Err(NOT_NULL.to_string()),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(NOT_BOOLEAN.to_string()),
    }
}
