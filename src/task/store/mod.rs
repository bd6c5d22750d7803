//! Task storage module with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database file
//!
//! Stores never report a missing task as an error: lookups return `None`
//! and deletes return `false`. Deciding that absence is a failure is the
//! service's job.

mod memory;
mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;

use super::task::{NewTask, Pagination, Task, TaskFilter, TaskId, TaskPage, UpdateTask};

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to prepare storage directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Corrupt task row {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Current UTC time truncated to the precision every backend stores.
///
/// Truncating here keeps the value returned from `create` identical to the
/// value read back later.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::parse_from_rfc3339(&format_timestamp(&now))
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Fixed-width RFC 3339 so lexical order matches chronological order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Task store trait - implemented by all storage backends.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Persist a new task with status `TO_DO` and fresh id/timestamps.
    async fn create(&self, new_task: NewTask) -> StoreResult<Task>;

    /// List tasks matching `filter`, newest `created_at` first, windowed by
    /// `pagination`. `total` counts every match, ignoring the window.
    async fn find_all(&self, filter: TaskFilter, pagination: Pagination) -> StoreResult<TaskPage>;

    /// Get a single task by ID.
    async fn find_by_id(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Apply the filtered fields of `update` (see [`UpdateTask::changes`]).
    ///
    /// An empty change set skips the write and only re-reads. Otherwise
    /// `updated_at` is refreshed. Returns the fresh record, or `None` when
    /// the task does not exist.
    async fn update(&self, id: TaskId, update: &UpdateTask) -> StoreResult<Option<Task>>;

    /// Remove a task. Returns whether a row was actually removed.
    async fn delete(&self, id: TaskId) -> StoreResult<bool>;

    /// Existence check without loading the record.
    async fn exists(&self, id: TaskId) -> StoreResult<bool>;
}

/// Task store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStoreType {
    Memory,
    #[default]
    Sqlite,
}

impl TaskStoreType {
    /// Parse from environment variable value. Returns `None` for unknown
    /// names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" | "db" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Create a task store based on type and configuration.
pub async fn create_task_store(
    store_type: TaskStoreType,
    database_path: PathBuf,
) -> StoreResult<Box<dyn TaskStore>> {
    match store_type {
        TaskStoreType::Memory => Ok(Box::new(InMemoryTaskStore::new())),
        TaskStoreType::Sqlite => {
            let store = SqliteTaskStore::open(database_path).await?;
            Ok(Box::new(store))
        }
    }
}

/// Behaviour every backend must share. Each backend's test module runs
/// these against its own store.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::task::patch::Patch;
    use crate::task::task::TaskStatus;
    use std::time::Duration;

    pub async fn create_forces_to_do(store: &dyn TaskStore) {
        let task = store
            .create(NewTask::new("A"))
            .await
            .expect("Failed to create task");

        assert_eq!(task.title, "A");
        assert_eq!(task.description, None);
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.created_at, task.updated_at);

        let loaded = store
            .find_by_id(task.id)
            .await
            .expect("Failed to load task")
            .expect("Task not found");
        assert_eq!(loaded, task);
    }

    pub async fn find_by_id_missing_is_none(store: &dyn TaskStore) {
        let missing = store
            .find_by_id(TaskId::new())
            .await
            .expect("Lookup should not fail");
        assert!(missing.is_none());
        assert!(!store.exists(TaskId::new()).await.expect("exists"));
    }

    pub async fn find_all_orders_filters_and_paginates(store: &dyn TaskStore) {
        let mut created = Vec::new();
        for i in 0..7 {
            let task = store
                .create(NewTask::new(format!("task {i}")))
                .await
                .expect("Failed to create task");
            created.push(task);
        }
        for task in created.iter().take(3) {
            let update = UpdateTask {
                status: Patch::Value(TaskStatus::Done),
                ..UpdateTask::default()
            };
            store.update(task.id, &update).await.expect("update");
        }

        let all = store
            .find_all(TaskFilter::default(), Pagination { page: 1, limit: 10 })
            .await
            .expect("list");
        assert_eq!(all.total, 7);
        let titles: Vec<_> = all.data.iter().map(|t| t.title.clone()).collect();
        let expected: Vec<_> = (0..7).rev().map(|i| format!("task {i}")).collect();
        assert_eq!(titles, expected, "newest first");

        let second_page = store
            .find_all(TaskFilter::default(), Pagination { page: 2, limit: 3 })
            .await
            .expect("list page 2");
        assert_eq!(second_page.total, 7);
        let titles: Vec<_> = second_page.data.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["task 3", "task 2", "task 1"]);

        let past_end = store
            .find_all(TaskFilter::default(), Pagination { page: 4, limit: 3 })
            .await
            .expect("list past end");
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.total, 7);

        let done = store
            .find_all(
                TaskFilter {
                    status: Some(TaskStatus::Done),
                },
                Pagination { page: 1, limit: 2 },
            )
            .await
            .expect("filtered list");
        assert_eq!(done.total, 3);
        assert_eq!(done.data.len(), 2);
        assert!(done.data.iter().all(|t| t.status == TaskStatus::Done));
    }

    pub async fn update_applies_only_supplied_fields(store: &dyn TaskStore) {
        let task = store
            .create(NewTask::new("A").with_description("first"))
            .await
            .expect("create");
        tokio::time::sleep(Duration::from_millis(5)).await;

        let update = UpdateTask {
            status: Patch::Value(TaskStatus::InProgress),
            ..UpdateTask::default()
        };
        let updated = store
            .update(task.id, &update)
            .await
            .expect("update")
            .expect("task exists");

        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.description, task.description);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at > task.updated_at);
    }

    pub async fn update_null_description_clears(store: &dyn TaskStore) {
        let task = store
            .create(NewTask::new("A").with_description("first"))
            .await
            .expect("create");

        let update = UpdateTask {
            description: Patch::Null,
            ..UpdateTask::default()
        };
        let updated = store
            .update(task.id, &update)
            .await
            .expect("update")
            .expect("task exists");
        assert_eq!(updated.description, None);
        assert_eq!(updated.title, "A");
        assert_eq!(updated.status, TaskStatus::ToDo);
    }

    pub async fn update_with_nothing_to_write_is_noop(store: &dyn TaskStore) {
        let task = store.create(NewTask::new("A")).await.expect("create");

        let unchanged = store
            .update(task.id, &UpdateTask::default())
            .await
            .expect("update")
            .expect("task exists");
        assert_eq!(unchanged, task);

        let invalid_nulls = UpdateTask {
            title: Patch::Null,
            status: Patch::Null,
            ..UpdateTask::default()
        };
        let unchanged = store
            .update(task.id, &invalid_nulls)
            .await
            .expect("update")
            .expect("task exists");
        assert_eq!(unchanged, task, "null title/status must be dropped");
    }

    pub async fn update_missing_is_none(store: &dyn TaskStore) {
        let update = UpdateTask {
            title: Patch::Value("B".to_string()),
            ..UpdateTask::default()
        };
        let result = store.update(TaskId::new(), &update).await.expect("update");
        assert!(result.is_none());
    }

    pub async fn delete_reports_removal(store: &dyn TaskStore) {
        let task = store.create(NewTask::new("A")).await.expect("create");
        assert!(store.exists(task.id).await.expect("exists"));

        assert!(store.delete(task.id).await.expect("delete"));
        assert!(!store.exists(task.id).await.expect("exists"));
        assert!(!store.delete(task.id).await.expect("second delete"));
        assert!(store.find_by_id(task.id).await.expect("lookup").is_none());
    }

    pub async fn run_all<S, F>(make_store: F)
    where
        S: TaskStore,
        F: Fn() -> S,
    {
        create_forces_to_do(&make_store()).await;
        find_by_id_missing_is_none(&make_store()).await;
        find_all_orders_filters_and_paginates(&make_store()).await;
        update_applies_only_supplied_fields(&make_store()).await;
        update_null_description_clears(&make_store()).await;
        update_with_nothing_to_write_is_noop(&make_store()).await;
        update_missing_is_none(&make_store()).await;
        delete_reports_removal(&make_store()).await;
    }
}
