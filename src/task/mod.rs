//! Task module - the task record, request validation, storage and service.
//!
//! Layering, leaf-first:
//! - `task`: record and request types, pagination arithmetic
//! - `validation`: raw JSON / query string to typed requests
//! - `store`: persistence backends behind the [`TaskStore`] trait
//! - `service`: existence checks and not-found semantics over a store

pub mod patch;
pub mod service;
pub mod store;
pub mod task;
pub mod validation;

pub use patch::Patch;
pub use service::{TaskError, TaskResult, TaskService};
pub use store::{
    create_task_store, InMemoryTaskStore, SqliteTaskStore, StoreError, StoreResult, TaskStore,
    TaskStoreType,
};
pub use task::{
    NewTask, PaginatedTasks, Pagination, Task, TaskChanges, TaskFilter, TaskId, TaskPage,
    TaskQuery, TaskStatus, UpdateTask,
};
pub use validation::{FieldError, ValidationError};
