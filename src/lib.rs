//! # Task Manager API
//!
//! RESTful service for managing tasks.
//!
//! ## Request Flow
//!
//! ```text
//!   HTTP request
//!        │
//!        ▼
//!   ┌──────────────┐   rejects malformed input (400)
//!   │  validation  │
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐   existence checks, not-found (404), pagination
//!   │   service    │
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐   memory or SQLite
//!   │    store     │
//!   └──────────────┘
//! ```
//!
//! ## Modules
//! - `api`: axum router, handlers and error rendering
//! - `task`: task record, validation, storage backends and service
//! - `config`: environment-driven configuration

pub mod api;
pub mod config;
pub mod task;

pub use config::Config;
pub use task::{Task, TaskService, TaskStatus, TaskStore};
