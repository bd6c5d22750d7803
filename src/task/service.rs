//! Task service: existence checks, not-found semantics and pagination.
//!
//! Update and delete check existence and then act in a second store call.
//! A concurrent delete landing between the two is not prevented: a racing
//! update then reports `NotFound`, and a racing delete finds nothing to
//! remove and still returns success.

use std::sync::Arc;

use super::store::{StoreError, TaskStore};
use super::task::{NewTask, PaginatedTasks, Task, TaskId, TaskQuery, UpdateTask};

/// Errors surfaced by [`TaskService`].
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task with ID \"{0}\" not found")]
    NotFound(TaskId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    pub async fn create(&self, new_task: NewTask) -> TaskResult<Task> {
        let task = self.store.create(new_task).await?;
        tracing::info!(task_id = %task.id, "Created task");
        Ok(task)
    }

    /// List tasks. Omitted page/limit use the defaults, and the echoed
    /// `page`/`limit`/`totalPages` are computed from those effective values.
    pub async fn find_all(&self, query: TaskQuery) -> TaskResult<PaginatedTasks> {
        let pagination = query.pagination();
        let page = self.store.find_all(query.filter(), pagination).await?;

        Ok(PaginatedTasks {
            total_pages: pagination.total_pages(page.total),
            data: page.data,
            total: page.total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    pub async fn find_by_id(&self, id: TaskId) -> TaskResult<Task> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(TaskError::NotFound(id))
    }

    pub async fn update(&self, id: TaskId, update: UpdateTask) -> TaskResult<Task> {
        if !self.store.exists(id).await? {
            return Err(TaskError::NotFound(id));
        }

        let task = self
            .store
            .update(id, &update)
            .await?
            .ok_or(TaskError::NotFound(id))?;
        tracing::info!(task_id = %id, "Updated task");
        Ok(task)
    }

    pub async fn delete(&self, id: TaskId) -> TaskResult<()> {
        if !self.store.exists(id).await? {
            return Err(TaskError::NotFound(id));
        }

        if !self.store.delete(id).await? {
            tracing::debug!(task_id = %id, "Task vanished before delete");
        }
        tracing::info!(task_id = %id, "Deleted task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::patch::Patch;
    use crate::task::store::InMemoryTaskStore;
    use crate::task::task::TaskStatus;

    fn service() -> TaskService {
        TaskService::new(Arc::new(InMemoryTaskStore::new()))
    }

    async fn seed(service: &TaskService, count: usize) {
        for i in 0..count {
            service
                .create(NewTask::new(format!("task {i}")))
                .await
                .expect("Failed to create task");
        }
    }

    #[tokio::test]
    async fn test_find_all_applies_defaults() {
        let service = service();
        seed(&service, 1).await;

        let page = service
            .find_all(TaskQuery::default())
            .await
            .expect("list");
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.data.len(), 1);
    }

    #[tokio::test]
    async fn test_find_all_total_pages_rounds_up() {
        let service = service();
        seed(&service, 10).await;

        let page = service
            .find_all(TaskQuery {
                limit: Some(3),
                ..TaskQuery::default()
            })
            .await
            .expect("list");
        assert_eq!(page.total, 10);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.data.len(), 3);

        let last = service
            .find_all(TaskQuery {
                page: Some(4),
                limit: Some(3),
                ..TaskQuery::default()
            })
            .await
            .expect("last page");
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.page, 4);
    }

    #[tokio::test]
    async fn test_find_all_empty_store() {
        let page = service()
            .find_all(TaskQuery::default())
            .await
            .expect("list");
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_not_found() {
        let id = TaskId::new();
        let err = service().find_by_id(id).await.expect_err("missing");
        assert!(matches!(err, TaskError::NotFound(missing) if missing == id));
        assert_eq!(err.to_string(), format!("Task with ID \"{id}\" not found"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let update = UpdateTask {
            title: Patch::Value("B".to_string()),
            ..UpdateTask::default()
        };
        let err = service()
            .update(TaskId::new(), update)
            .await
            .expect_err("missing");
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let service = service();
        let task = service
            .create(NewTask::new("A").with_description("keep me"))
            .await
            .expect("create");

        let updated = service
            .update(
                task.id,
                UpdateTask {
                    status: Patch::Value(TaskStatus::InProgress),
                    ..UpdateTask::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.title, "A");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let service = service();
        let task = service.create(NewTask::new("A")).await.expect("create");

        service.delete(task.id).await.expect("first delete");
        let err = service.delete(task.id).await.expect_err("second delete");
        assert!(matches!(err, TaskError::NotFound(_)));
        assert!(matches!(
            service.find_by_id(task.id).await,
            Err(TaskError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_scenario() {
        let service = service();
        let created = service.create(NewTask::new("A")).await.expect("create");
        assert_eq!(created.status, TaskStatus::ToDo);
        assert_eq!(created.description, None);

        let cleared = service
            .update(
                created.id,
                UpdateTask {
                    description: Patch::Null,
                    ..UpdateTask::default()
                },
            )
            .await
            .expect("clear description");
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.title, created.title);
        assert_eq!(cleared.status, created.status);

        let unchanged = service
            .update(created.id, UpdateTask::default())
            .await
            .expect("empty update");
        assert_eq!(unchanged, cleared);

        service.delete(created.id).await.expect("delete");
        assert!(service.find_by_id(created.id).await.is_err());
    }
}
