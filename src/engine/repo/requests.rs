//! Request Repository: list/get/create/update/delete for requests.

use super::hours_from_sql;
use super::tasks::TaskRepo;
use crate::engine::error::EngineError;
use crate::engine::types::{
    clamp_hours, BillingMode, NewRequest, Request, RequestPatch, RequestStatus, TaskStatus,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

const REQUEST_SELECT: &str = "SELECT id, vehicle_job_id, registration, work_description, \
     status, overall_labour_hours, created_at, updated_at FROM requests";

pub struct RequestRepo<'a> {
    conn: &'a Connection,
}

impl<'a> RequestRepo<'a> {
    /// Creates a new repository instance borrowing the connection.
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Retrieves all requests in submission order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list(&self) -> Result<Vec<Request>> {
        let sql = format!("{REQUEST_SELECT} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |r| self.row_to_request(r))?;
        let mut requests = Vec::new();
        for request in rows {
            requests.push(request?);
        }
        Ok(requests)
    }

    /// Finds a request by its internal ID.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get(&self, id: i64) -> Result<Option<Request>> {
        let sql = format!("{REQUEST_SELECT} WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], |r| self.row_to_request(r))
            .optional()
            .context("Search by ID failed")
    }

    /// Submits a new request.
    ///
    /// Caller-supplied statuses are discarded: the request and every task start
    /// `Pending`. An overall labour figure is dropped when tasks are present.
    ///
    /// # Errors
    /// Returns `MissingField` for a blank required field, or a storage error.
    pub fn create(&self, draft: NewRequest) -> Result<Request> {
        draft.validate()?;

        let NewRequest {
            vehicle_job_id,
            registration,
            work_description,
            overall_labour_hours,
            mut tasks,
        } = draft;

        if !tasks.is_empty() && overall_labour_hours.is_some() {
            tracing::warn!(
                vehicle_job_id = %vehicle_job_id,
                "overall labour ignored for a request with itemised tasks"
            );
        }
        for task in &mut tasks {
            task.status = TaskStatus::Pending;
            task.description = task.description.trim().to_string();
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut request = Request {
            id: 0,
            vehicle_job_id: vehicle_job_id.trim().to_string(),
            registration: registration.trim().to_string(),
            work_description: work_description.trim().to_string(),
            billing: BillingMode::from_parts(tasks, overall_labour_hours.map(clamp_hours)),
            status: RequestStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        };
        request.refresh_status();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO requests (vehicle_job_id, registration, work_description, status, overall_labour_hours, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.vehicle_job_id,
                request.registration,
                request.work_description,
                request.status.as_str(),
                request.billing.overall_labour_hours(),
                request.created_at,
                request.updated_at
            ],
        )?;
        request.id = tx.last_insert_rowid();
        TaskRepo::new(&tx).replace_for(request.id, request.tasks())?;
        tx.commit()?;

        tracing::info!(
            request_id = request.id,
            tasks = request.tasks().len(),
            "request submitted"
        );
        Ok(request)
    }

    /// Applies a partial update and returns the stored result.
    ///
    /// The status is re-derived whenever the request ends up with tasks.
    ///
    /// # Errors
    /// Returns `RequestNotFound` for an unknown id, or a storage error.
    pub fn update(&self, id: i64, patch: RequestPatch) -> Result<Request> {
        let mut request = self.get(id)?.ok_or(EngineError::RequestNotFound(id))?;
        request.apply_patch(patch);
        self.save(&mut request)?;
        Ok(request)
    }

    /// Persists a request mutated in memory, replacing its task list.
    ///
    /// The cached status is refreshed first so a stale value never lands in
    /// the database.
    ///
    /// # Errors
    /// Returns `RequestNotFound` if the row is gone, or a storage error.
    pub fn save(&self, request: &mut Request) -> Result<()> {
        request.refresh_status();
        request.updated_at = chrono::Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE requests SET vehicle_job_id = ?1, registration = ?2, work_description = ?3,
             status = ?4, overall_labour_hours = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                request.vehicle_job_id,
                request.registration,
                request.work_description,
                request.status.as_str(),
                request.billing.overall_labour_hours(),
                request.updated_at,
                request.id
            ],
        )?;
        if changed == 0 {
            return Err(EngineError::RequestNotFound(request.id).into());
        }
        TaskRepo::new(&tx).replace_for(request.id, request.tasks())?;
        tx.commit()?;

        tracing::debug!(
            request_id = request.id,
            status = request.status.as_str(),
            "request saved"
        );
        Ok(())
    }

    /// Deletes a request and its tasks.
    ///
    /// # Errors
    /// Returns `RequestNotFound` for an unknown id, or a storage error.
    pub fn delete(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tasks WHERE request_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM requests WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(EngineError::RequestNotFound(id).into());
        }
        tx.commit()?;
        tracing::info!(request_id = id, "request deleted");
        Ok(())
    }

    /// Converts a database row to a Request object.
    ///
    /// A stored itemised status is not trusted: it is re-derived from the
    /// loaded tasks.
    ///
    /// # Errors
    /// Returns a `rusqlite` error if data conversion fails.
    pub fn row_to_request(&self, row: &rusqlite::Row) -> rusqlite::Result<Request> {
        let id: i64 = row.get(0)?;
        let tasks = TaskRepo::new(self.conn).list_for(id)?;
        let overall = hours_from_sql(row.get_ref(5)?);

        let mut request = Request {
            id,
            vehicle_job_id: row.get(1)?,
            registration: row.get(2)?,
            work_description: row.get(3)?,
            billing: BillingMode::from_parts(tasks, overall),
            status: RequestStatus::from(row.get::<_, String>(4)?),
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        };
        request.refresh_status();
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::db::Db;
    use crate::engine::types::Task;

    fn draft_with_tasks() -> NewRequest {
        let mut draft = NewRequest::new("W100", "AB12 CDE", "Front brakes");
        draft.add_task(Task::new("Pads", 0.5).with_status(TaskStatus::Authorised));
        draft.add_task(Task::new("Discs", 0.3).with_parts(true));
        draft
    }

    #[test]
    fn test_create_forces_pending() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);

        let created = repo.create(draft_with_tasks()).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status, RequestStatus::Pending);
        assert!(created.tasks().iter().all(|t| t.status == TaskStatus::Pending));

        let loaded = repo.get(created.id).unwrap().unwrap();
        assert_eq!(loaded.tasks().len(), 2);
        assert_eq!(loaded.tasks()[0].description, "Pads");
        assert!(loaded.tasks()[1].parts_required);
        assert_eq!(loaded.status, RequestStatus::Pending);
    }

    #[test]
    fn test_create_drops_overall_when_itemised() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);

        let mut draft = draft_with_tasks();
        draft.overall_labour_hours = Some(9.0);
        let created = repo.create(draft).unwrap();
        assert_eq!(created.billing.overall_labour_hours(), None);
        assert!((created.requested_hours() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_create_clamps_overall_labour() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);

        let mut draft = NewRequest::new("W5", "REG5", "Diagnostics");
        draft.overall_labour_hours = Some(-3.0);
        let created = repo.create(draft).unwrap();
        assert_eq!(created.billing, BillingMode::FlatRate(Some(0.0)));

        let stored: f64 = conn
            .query_row(
                "SELECT overall_labour_hours FROM requests WHERE id = ?1",
                params![created.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stored, 0.0);
    }

    #[test]
    fn test_create_rejects_missing_fields() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);

        let err = repo.create(NewRequest::new("W1", "", "Work")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::MissingField {
                field: "registration"
            })
        );
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_in_submission_order() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);

        repo.create(NewRequest::new("W1", "REG1", "First").with_overall_labour(1.0))
            .unwrap();
        repo.create(NewRequest::new("W2", "REG2", "Second")).unwrap();

        let all = repo.list().unwrap();
        let wips: Vec<_> = all.iter().map(|r| r.vehicle_job_id.as_str()).collect();
        assert_eq!(wips, ["W1", "W2"]);
        assert_eq!(all[0].billing, BillingMode::FlatRate(Some(1.0)));
        assert_eq!(all[1].billing, BillingMode::FlatRate(None));
    }

    #[test]
    fn test_update_rederives_from_tasks() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);
        let created = repo.create(draft_with_tasks()).unwrap();

        let mut tasks = created.tasks().to_vec();
        tasks[0].status = TaskStatus::Authorised;
        let updated = repo
            .update(
                created.id,
                RequestPatch {
                    status: Some(RequestStatus::Declined),
                    tasks: Some(tasks),
                },
            )
            .unwrap();
        assert_eq!(updated.status, RequestStatus::PartiallyAuthorised);

        let loaded = repo.get(created.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::PartiallyAuthorised);
        assert_eq!(loaded.tasks()[0].status, TaskStatus::Authorised);
    }

    #[test]
    fn test_update_flat_rate_status() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);
        let created = repo
            .create(NewRequest::new("W3", "REG3", "Diagnostics").with_overall_labour(2.0))
            .unwrap();

        repo.update(
            created.id,
            RequestPatch {
                status: Some(RequestStatus::AwaitingCustomerResponse),
                tasks: None,
            },
        )
        .unwrap();

        let loaded = repo.get(created.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::AwaitingCustomerResponse);
    }

    #[test]
    fn test_update_unknown_id() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);
        let err = repo.update(42, RequestPatch::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::RequestNotFound(42))
        );
    }

    #[test]
    fn test_save_after_approve_all() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);
        let mut request = repo.create(draft_with_tasks()).unwrap();

        request.approve_all();
        repo.save(&mut request).unwrap();

        let loaded = repo.get(request.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Authorised);
        assert!((loaded.approved_hours() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_delete_removes_tasks() {
        let conn = Db::in_memory().unwrap();
        let repo = RequestRepo::new(&conn);
        let created = repo.create(draft_with_tasks()).unwrap();

        repo.delete(created.id).unwrap();
        assert!(repo.get(created.id).unwrap().is_none());
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
        assert!(repo.delete(created.id).is_err());
    }

    #[test]
    fn test_legacy_rows_are_read_leniently() {
        let conn = Db::in_memory().unwrap();
        conn.execute(
            "INSERT INTO requests (id, vehicle_job_id, registration, work_description, status, overall_labour_hours, created_at, updated_at)
             VALUES (1, 'W9', 'REG9', 'Clutch', 'Awaiting customer contact', 'three', 'x', 'x'),
                    (2, 'W10', 'REG10', 'Gearbox', 'Partially approved', NULL, 'x', 'x')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (request_id, position, description, estimated_hours, parts_required, status)
             VALUES (2, 0, 'Strip down', '1.5', 0, 'authorised'),
                    (2, 1, 'Inspect', -2, 0, 'on_hold')",
            [],
        )
        .unwrap();

        let repo = RequestRepo::new(&conn);
        let flat = repo.get(1).unwrap().unwrap();
        assert_eq!(flat.status, RequestStatus::AwaitingCustomerResponse);
        assert_eq!(flat.billing, BillingMode::FlatRate(Some(0.0)));

        let itemised = repo.get(2).unwrap().unwrap();
        assert_eq!(itemised.tasks()[1].status, TaskStatus::Unrecognised);
        assert_eq!(itemised.status, RequestStatus::PartiallyAuthorised);
        assert_eq!(itemised.approved_hours(), 1.5);
        assert_eq!(itemised.requested_hours(), 1.5);
    }
}
