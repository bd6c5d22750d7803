//! Task API endpoints.
//!
//! - `POST /tasks` - Create a task (201)
//! - `GET /tasks` - List tasks with `status`, `page`, `limit` query parameters
//! - `GET /tasks/:id` - Get one task
//! - `PATCH /tasks/:id` - Partially update a task
//! - `DELETE /tasks/:id` - Delete a task (204)

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::ApiError;
use super::routes::AppState;
use crate::task::validation::{validate_create, validate_id, validate_query, validate_update};
use crate::task::{PaginatedTasks, Task};

/// Create task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route(
            "/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
}

/// Turn an extractor failure on the body into a validation error on `body`.
fn body_or_reject(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid("body", rejection.body_text()))
}

/// POST /tasks - Create a new task.
async fn create_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let new_task = validate_create(&body_or_reject(payload)?)?;
    let task = state.tasks.create(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks - List tasks with optional filtering and pagination.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<PaginatedTasks>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::invalid("query", rejection.body_text()))?;
    let query = validate_query(&params)?;
    Ok(Json(state.tasks.find_all(query).await?))
}

/// GET /tasks/:id - Get a task by ID.
async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = validate_id(&id)?;
    Ok(Json(state.tasks.find_by_id(id).await?))
}

/// PATCH /tasks/:id - Update only the supplied fields of a task.
async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = validate_id(&id)?;
    let update = validate_update(&body_or_reject(payload)?)?;
    Ok(Json(state.tasks.update(id, update).await?))
}

/// DELETE /tasks/:id - Delete a task.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id(&id)?;
    state.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
