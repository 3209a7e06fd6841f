//! Task Repository: the itemised lines belonging to a request.

use super::hours_from_sql;
use crate::engine::types::{clamp_hours, Task, TaskStatus};
use anyhow::Result;
use rusqlite::{params, Connection};

const TASK_SELECT: &str =
    "SELECT description, estimated_hours, parts_required, status FROM tasks";

pub struct TaskRepo<'a> {
    conn: &'a Connection,
}

impl<'a> TaskRepo<'a> {
    /// Creates a new repository instance borrowing the connection.
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns a request's tasks in display order.
    ///
    /// # Errors
    /// Returns a `rusqlite` error if query logic fails.
    pub fn list_for(&self, request_id: i64) -> rusqlite::Result<Vec<Task>> {
        let sql = format!("{TASK_SELECT} WHERE request_id = ?1 ORDER BY position, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![request_id], |row| {
            Ok(Task {
                description: row.get(0)?,
                estimated_hours: hours_from_sql(row.get_ref(1)?).unwrap_or(0.0),
                parts_required: row.get(2)?,
                status: TaskStatus::from(row.get::<_, String>(3)?),
            })
        })?;

        let mut tasks = Vec::new();
        for t in rows {
            tasks.push(t?);
        }
        Ok(tasks)
    }

    /// Replaces a request's task list. Positions follow slice order and
    /// hours are stored clamped.
    ///
    /// Run inside a transaction; the delete and inserts are separate statements.
    ///
    /// # Errors
    /// Returns an error if a statement fails.
    pub fn replace_for(&self, request_id: i64, tasks: &[Task]) -> Result<()> {
        self.conn
            .execute("DELETE FROM tasks WHERE request_id = ?1", params![request_id])?;

        let mut stmt = self.conn.prepare(
            "INSERT INTO tasks (request_id, position, description, estimated_hours, parts_required, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (position, task) in (0_i64..).zip(tasks) {
            stmt.execute(params![
                request_id,
                position,
                task.description,
                clamp_hours(task.estimated_hours),
                task.parts_required,
                task.status.as_str()
            ])?;
        }
        Ok(())
    }
}
