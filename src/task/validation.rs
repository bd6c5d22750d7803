//! Request validation for task payloads and list queries.
//!
//! Each shape has one validator that inspects the raw JSON (or query map),
//! collects every violation, and only returns a typed request when the
//! whole payload is acceptable. Properties outside a shape's whitelist are
//! rejected with `property <name> should not exist`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::patch::Patch;
use super::task::{
    NewTask, TaskId, TaskQuery, TaskStatus, UpdateTask, MAX_LIMIT, TITLE_MAX_CHARS,
};

const CREATE_PROPERTIES: &[&str] = &["title", "description"];
const UPDATE_PROPERTIES: &[&str] = &["title", "description", "status"];
const QUERY_PROPERTIES: &[&str] = &["status", "page", "limit"];

/// One rejected property and the constraint it broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All violations found in one request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    /// Whether any violation concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn status_choices() -> String {
    TaskStatus::ALL
        .iter()
        .map(TaskStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn too_long(field: &str) -> FieldError {
    FieldError::new(
        field,
        format!("{field} must be shorter than or equal to {TITLE_MAX_CHARS} characters"),
    )
}

/// Title length in UTF-16 code units, so a character outside the BMP
/// counts twice.
fn title_len(title: &str) -> usize {
    title.encode_utf16().count()
}

fn reject_unknown<'a>(
    keys: impl IntoIterator<Item = &'a String>,
    allowed: &[&str],
    errors: &mut Vec<FieldError>,
) {
    let mut unknown: Vec<&String> = keys
        .into_iter()
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect();
    unknown.sort();
    errors.extend(
        unknown
            .into_iter()
            .map(|key| FieldError::new(key.as_str(), format!("property {key} should not exist"))),
    );
}

fn as_object<'a>(payload: &'a Value) -> Result<&'a Map<String, Value>, ValidationError> {
    payload
        .as_object()
        .ok_or_else(|| ValidationError::single("body", "request body must be a JSON object"))
}

/// Validate a create payload: `title` required (1..=255 UTF-16 units),
/// `description` optional string. `status` is not accepted here.
pub fn validate_create(payload: &Value) -> Result<NewTask, ValidationError> {
    let body = as_object(payload)?;
    let mut errors = Vec::new();
    reject_unknown(body.keys(), CREATE_PROPERTIES, &mut errors);

    let title = match body.get("title") {
        Some(Value::String(title)) => {
            if title.is_empty() {
                errors.push(FieldError::new("title", "title should not be empty"));
            }
            if title_len(title) > TITLE_MAX_CHARS {
                errors.push(too_long("title"));
            }
            Some(title.clone())
        }
        _ => {
            errors.push(FieldError::new("title", "title must be a string"));
            None
        }
    };

    let description = match body.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(description)) => Some(description.clone()),
        Some(_) => {
            errors.push(FieldError::new("description", "description must be a string"));
            None
        }
    };

    match title {
        Some(title) if errors.is_empty() => Ok(NewTask { title, description }),
        _ => Err(ValidationError::new(errors)),
    }
}

/// Validate a partial update. Only properties present in the payload are
/// checked; absent ones stay [`Patch::Unset`].
pub fn validate_update(payload: &Value) -> Result<UpdateTask, ValidationError> {
    let body = as_object(payload)?;
    let mut errors = Vec::new();
    let mut update = UpdateTask::default();
    reject_unknown(body.keys(), UPDATE_PROPERTIES, &mut errors);

    match body.get("title") {
        None => {}
        Some(Value::String(title)) => {
            if title.is_empty() {
                errors.push(FieldError::new("title", "Title cannot be empty"));
            }
            if title_len(title) > TITLE_MAX_CHARS {
                errors.push(too_long("title"));
            }
            update.title = Patch::Value(title.clone());
        }
        Some(_) => errors.push(FieldError::new(
            "title",
            "Title must be a string and cannot be null",
        )),
    }

    match body.get("description") {
        None => {}
        Some(Value::Null) => update.description = Patch::Null,
        Some(Value::String(description)) => update.description = Patch::Value(description.clone()),
        Some(_) => errors.push(FieldError::new(
            "description",
            "Description must be a string when provided",
        )),
    }

    match body.get("status") {
        None => {}
        Some(value) => match value.as_str().map(str::parse::<TaskStatus>) {
            Some(Ok(status)) => update.status = Patch::Value(status),
            _ => errors.push(FieldError::new(
                "status",
                "Status must be a valid TaskStatus enum value and cannot be null",
            )),
        },
    }

    if errors.is_empty() {
        Ok(update)
    } else {
        Err(ValidationError::new(errors))
    }
}

/// Validate list query parameters.
///
/// `page` must be an integer >= 1 and `limit` an integer in `1..=100`.
/// Omitted values stay `None` so the caller applies the defaults.
pub fn validate_query(params: &HashMap<String, String>) -> Result<TaskQuery, ValidationError> {
    let mut errors = Vec::new();
    let mut query = TaskQuery::default();
    reject_unknown(params.keys(), QUERY_PROPERTIES, &mut errors);

    if let Some(raw) = params.get("status") {
        match raw.parse::<TaskStatus>() {
            Ok(status) => query.status = Some(status),
            Err(_) => errors.push(FieldError::new(
                "status",
                format!("status must be one of the following values: {}", status_choices()),
            )),
        }
    }

    if let Some(raw) = params.get("page") {
        match parse_integer(raw) {
            None => errors.push(FieldError::new("page", "page must be an integer number")),
            Some(page) if page < 1 => {
                errors.push(FieldError::new("page", "page must not be less than 1"))
            }
            Some(page) => match u32::try_from(page) {
                Ok(page) => query.page = Some(page),
                Err(_) => errors.push(FieldError::new("page", "page is too large")),
            },
        }
    }

    if let Some(raw) = params.get("limit") {
        match parse_integer(raw) {
            None => errors.push(FieldError::new("limit", "limit must be an integer number")),
            Some(limit) if limit < 1 => {
                errors.push(FieldError::new("limit", "limit must not be less than 1"))
            }
            Some(limit) if limit > i64::from(MAX_LIMIT) => errors.push(FieldError::new(
                "limit",
                format!("limit must not be greater than {MAX_LIMIT}"),
            )),
            // Bounded by MAX_LIMIT above.
            Some(limit) => query.limit = Some(limit as u32),
        }
    }

    if errors.is_empty() {
        Ok(query)
    } else {
        Err(ValidationError::new(errors))
    }
}

/// Accepts optional sign and digits only; "1.5", "abc" and "" are rejected.
fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Validate a task id path segment.
pub fn validate_id(raw: &str) -> Result<TaskId, ValidationError> {
    TaskId::parse(raw).map_err(|_| ValidationError::single("id", "id must be a UUID"))
}
