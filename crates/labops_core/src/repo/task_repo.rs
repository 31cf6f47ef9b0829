//! Task repository contracts and SQLite implementation.
//!
//! # Invariants
//! - The `assignee_id` foreign key backs assignee existence at insert time.
//! - Task deletion is a plain delete with no archive copy.
//! - Listing order is `created_at DESC, id ASC`.

use super::{parse_uuid, scope_filter, RepoError, RepoResult};
use crate::access::Visibility;
use crate::model::task::{Task, TaskId, TaskStatus};
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    assignee_id,
    creator_id,
    status,
    due_date,
    created_at,
    updated_at
FROM tasks";

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, visibility: &Visibility) -> RepoResult<Vec<Task>>;
    fn count_tasks(&self, visibility: &Visibility) -> RepoResult<u64>;
    fn update_task_status(&self, id: TaskId, status: TaskStatus, updated_at: i64)
        -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                assignee_id,
                creator_id,
                status,
                due_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                task.assignee.to_string(),
                task.creator.to_string(),
                task.status.as_str(),
                task.due_date.as_deref(),
                task.created_at,
                task.updated_at,
            ],
        )?;

        Ok(task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, visibility: &Visibility) -> RepoResult<Vec<Task>> {
        let Some(filter) = scope_filter(visibility, "assignee_id") else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "{TASK_SELECT_SQL}{} ORDER BY created_at DESC, id ASC;",
            filter.clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(filter.binds))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn count_tasks(&self, visibility: &Visibility) -> RepoResult<u64> {
        let Some(filter) = scope_filter(visibility, "assignee_id") else {
            return Ok(0);
        };
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM tasks{};", filter.clause),
            params_from_iter(filter.binds),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        updated_at: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3;",
            params![status.as_str(), updated_at, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let assignee_text: String = row.get("assignee_id")?;
    let creator_text: String = row.get("creator_id")?;
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    Ok(Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        assignee: parse_uuid(&assignee_text, "tasks.assignee_id")?,
        creator: parse_uuid(&creator_text, "tasks.creator_id")?,
        status,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
