//! SQLite-based task store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{format_timestamp, now, StoreError, StoreResult, TaskStore};
use crate::task::task::{
    NewTask, Pagination, Task, TaskFilter, TaskId, TaskPage, TaskStatus, UpdateTask,
};

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 255),
    description TEXT,
    status TEXT NOT NULL DEFAULT 'TO_DO'
        CHECK (status IN ('TO_DO', 'IN_PROGRESS', 'DONE')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, status, created_at, updated_at FROM tasks";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    /// Open (or create) the database file and apply the schema.
    pub async fn open(db_path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let display_path = db_path.display().to_string();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            Self::bootstrap(&conn)?;
            Ok::<_, StoreError>(conn)
        })
        .await??;

        tracing::info!(path = %display_path, "Opened SQLite task store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database with the same schema.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn bootstrap(conn: &Connection) -> StoreResult<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await?
    }
}

/// Intermediate row shape; conversion to [`Task`] can fail on bad data.
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_task(self) -> StoreResult<Task> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: self.id.clone(),
            reason,
        };
        let id = TaskId::parse(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let status = self
            .status
            .parse::<TaskStatus>()
            .map_err(|e| corrupt(e.to_string()))?;
        let created_at = parse_timestamp(&self.created_at).map_err(corrupt)?;
        let updated_at = parse_timestamp(&self.updated_at).map_err(corrupt)?;

        Ok(Task {
            id,
            title: self.title,
            description: self.description,
            status,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp `{value}`: {e}"))
}

fn load_task(conn: &Connection, id: &str) -> StoreResult<Option<Task>> {
    let row = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id],
            TaskRow::from_row,
        )
        .optional()?;
    row.map(TaskRow::into_task).transpose()
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn is_persistent(&self) -> bool {
        true
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

        let row = task.clone();
        self.with_conn(move |conn| {
            let stamp = format_timestamp(&row.created_at);
            conn.execute(
                "INSERT INTO tasks (id, title, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    row.id.to_string(),
                    row.title,
                    row.description,
                    row.status.as_str(),
                    stamp
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(task_id = %task.id, "Inserted task");
        Ok(task)
    }

    async fn find_all(&self, filter: TaskFilter, pagination: Pagination) -> StoreResult<TaskPage> {
        self.with_conn(move |conn| {
            let mut where_clause = String::new();
            let mut filter_params: Vec<Value> = Vec::new();
            if let Some(status) = filter.status {
                where_clause.push_str(" WHERE status = ?");
                filter_params.push(Value::Text(status.as_str().to_string()));
            }

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM tasks{where_clause}"),
                params_from_iter(filter_params.iter()),
                |row| row.get(0),
            )?;

            let mut page_params = filter_params.clone();
            page_params.push(Value::Integer(i64::from(pagination.limit)));
            page_params.push(Value::Integer(
                i64::try_from(pagination.skip()).unwrap_or(i64::MAX),
            ));

            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}{where_clause}
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ? OFFSET ?"
            ))?;
            let rows = stmt
                .query_map(params_from_iter(page_params.iter()), TaskRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            let data = rows
                .into_iter()
                .map(TaskRow::into_task)
                .collect::<StoreResult<Vec<_>>>()?;

            Ok(TaskPage {
                data,
                total: u64::try_from(total).unwrap_or_default(),
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let id = id.to_string();
        self.with_conn(move |conn| load_task(conn, &id)).await
    }

    async fn update(&self, id: TaskId, update: &UpdateTask) -> StoreResult<Option<Task>> {
        let changes = update.changes();
        let id_str = id.to_string();

        self.with_conn(move |conn| {
            if changes.is_empty() {
                return load_task(conn, &id_str);
            }

            let mut assignments = Vec::new();
            let mut values: Vec<Value> = Vec::new();
            if let Some(title) = changes.title {
                assignments.push("title = ?");
                values.push(Value::Text(title));
            }
            if let Some(description) = changes.description {
                assignments.push("description = ?");
                values.push(description.map_or(Value::Null, Value::Text));
            }
            if let Some(status) = changes.status {
                assignments.push("status = ?");
                values.push(Value::Text(status.as_str().to_string()));
            }
            // MAX keeps updated_at from falling behind created_at if the clock steps back.
            assignments.push("updated_at = MAX(?, created_at)");
            values.push(Value::Text(format_timestamp(&now())));
            values.push(Value::Text(id_str.clone()));

            let sql = format!("UPDATE tasks SET {} WHERE id = ?", assignments.join(", "));
            let affected = conn.execute(&sql, params_from_iter(values.iter()))?;
            if affected == 0 {
                return Ok(None);
            }
            tracing::debug!(task_id = %id_str, "Updated task");
            load_task(conn, &id_str)
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> StoreResult<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
    }

    async fn exists(&self, id: TaskId) -> StoreResult<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let found = conn
                .prepare_cached("SELECT 1 FROM tasks WHERE id = ?1")?
                .exists(params![id])?;
            Ok(found)
        })
        .await
    }
}
