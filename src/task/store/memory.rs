//! In-memory task store (non-persistent).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{now, StoreResult, TaskStore};
use crate::task::task::{
    NewTask, Pagination, Task, TaskFilter, TaskId, TaskPage, TaskStatus, UpdateTask,
};

/// A task plus its insertion sequence, used to break `created_at` ties.
#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    task: Task,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<TaskId, Entry>,
    next_seq: u64,
}

#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create(&self, new_task: NewTask) -> StoreResult<Task> {
        let now = now();
        let task = Task {
            id: TaskId::new(),
            title: new_task.title,
            description: new_task.description,
            status: TaskStatus::ToDo,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.tasks.insert(
            task.id,
            Entry {
                seq,
                task: task.clone(),
            },
        );
        Ok(task)
    }

    async fn find_all(&self, filter: TaskFilter, pagination: Pagination) -> StoreResult<TaskPage> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Entry> = inner
            .tasks
            .values()
            .filter(|entry| filter.matches(&entry.task))
            .collect();
        matching.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        let total = matching.len() as u64;
        let skip = usize::try_from(pagination.skip()).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(skip)
            .take(pagination.limit as usize)
            .map(|entry| entry.task.clone())
            .collect();
        Ok(TaskPage { data, total })
    }

    async fn find_by_id(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self
            .inner
            .read()
            .await
            .tasks
            .get(&id)
            .map(|entry| entry.task.clone()))
    }

    async fn update(&self, id: TaskId, update: &UpdateTask) -> StoreResult<Option<Task>> {
        let changes = update.changes();
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if !changes.is_empty() {
            changes.apply_to(&mut entry.task);
            entry.task.updated_at = now().max(entry.task.created_at);
        }
        Ok(Some(entry.task.clone()))
    }

    async fn delete(&self, id: TaskId) -> StoreResult<bool> {
        Ok(self.inner.write().await.tasks.remove(&id).is_some())
    }

    async fn exists(&self, id: TaskId) -> StoreResult<bool> {
        Ok(self.inner.read().await.tasks.contains_key(&id))
    }
}
