//! HTTP API for the task service.
//!
//! ## Endpoints
//!
//! - `POST /tasks` - Create a task
//! - `GET /tasks` - List tasks (`status`, `page`, `limit`)
//! - `GET /tasks/{id}` - Get a task
//! - `PATCH /tasks/{id}` - Partially update a task
//! - `DELETE /tasks/{id}` - Delete a task
//! - `GET /health` - Health check

pub mod error;
mod routes;
mod tasks;

pub use error::{ApiError, ErrorBody};
pub use routes::{router, serve, AppState, HealthResponse};
