//! Derived State Engine: Computes a request's status from its task statuses.
//!
//! This module is the "truth oracle" for itemised requests: whatever is cached
//! in `Request::status`, the answer is whatever `derive_status()` says for the
//! current task list. Flat-rate requests have no tasks, so their status is
//! whatever the authoriser last set.

use super::error::EngineError;
use super::types::{BillingMode, Request, RequestPatch, RequestStatus, Task, TaskEdit, TaskStatus};

/// Per-status counts for one task list.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: usize,
    authorised: usize,
    declined: usize,
    awaiting: usize,
}

impl Tally {
    fn of(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        let mut tally = Self::default();
        for status in statuses {
            tally.total += 1;
            match status {
                TaskStatus::Authorised => tally.authorised += 1,
                TaskStatus::Declined => tally.declined += 1,
                TaskStatus::AwaitingCustomerResponse => tally.awaiting += 1,
                TaskStatus::Pending | TaskStatus::Unrecognised => {}
            }
        }
        tally
    }
}

/// Derives the overall request status from a set of task statuses.
///
/// Rules are checked in priority order, first match wins:
/// 1. every task declined: `Declined`
/// 2. any task awaiting the customer: `AwaitingCustomerResponse`
/// 3. every task authorised: `Authorised`
/// 4. some task authorised: `PartiallyAuthorised`
/// 5. otherwise: `Pending`
///
/// Only counts are inspected, so the result does not depend on order.
///
/// # Errors
/// Returns `EmptyTaskList` if there are no statuses at all.
pub fn derive_from_statuses(
    statuses: impl IntoIterator<Item = TaskStatus>,
) -> Result<RequestStatus, EngineError> {
    let tally = Tally::of(statuses);

    if tally.total == 0 {
        return Err(EngineError::EmptyTaskList);
    }
    if tally.declined == tally.total {
        return Ok(RequestStatus::Declined);
    }
    if tally.awaiting > 0 {
        return Ok(RequestStatus::AwaitingCustomerResponse);
    }
    if tally.authorised == tally.total {
        return Ok(RequestStatus::Authorised);
    }
    if tally.authorised > 0 {
        return Ok(RequestStatus::PartiallyAuthorised);
    }
    Ok(RequestStatus::Pending)
}

/// Derives the overall request status from its tasks.
///
/// This is a pure function - no I/O, no side effects.
///
/// # Errors
/// Returns `EmptyTaskList` for an empty slice. Callers holding a flat-rate
/// request must use its stored status instead.
pub fn derive_status(tasks: &[Task]) -> Result<RequestStatus, EngineError> {
    derive_from_statuses(tasks.iter().map(|t| t.status))
}

/// Marks every task authorised and re-derives. Always `Authorised`.
///
/// # Errors
/// Returns `EmptyTaskList` for an empty slice.
pub fn approve_all(tasks: &mut [Task]) -> Result<RequestStatus, EngineError> {
    set_all(tasks, TaskStatus::Authorised)
}

/// Marks every task declined and re-derives. Always `Declined`.
///
/// # Errors
/// Returns `EmptyTaskList` for an empty slice.
pub fn decline_all(tasks: &mut [Task]) -> Result<RequestStatus, EngineError> {
    set_all(tasks, TaskStatus::Declined)
}

fn set_all(tasks: &mut [Task], status: TaskStatus) -> Result<RequestStatus, EngineError> {
    for task in tasks.iter_mut() {
        task.status = status;
    }
    derive_status(tasks)
}

/// Request-level mutations. Each one leaves `status` consistent with the
/// task list for itemised requests.
impl Request {
    /// Recomputes the cached status from the tasks.
    ///
    /// An itemised request with no tasks left falls back to flat-rate billing
    /// with no overall figure, keeping its current status.
    pub fn refresh_status(&mut self) -> RequestStatus {
        if let BillingMode::Itemised(tasks) = &self.billing {
            match derive_status(tasks) {
                Ok(status) => self.status = status,
                Err(_) => self.billing = BillingMode::FlatRate(None),
            }
        }
        self.status
    }

    /// Sets one task's status.
    ///
    /// # Errors
    /// Returns `TaskOutOfRange` if `index` does not name a task.
    pub fn set_task_status(
        &mut self,
        index: usize,
        status: TaskStatus,
    ) -> Result<RequestStatus, EngineError> {
        let edit = TaskEdit {
            status: Some(status),
            ..TaskEdit::default()
        };
        self.edit_task(index, &edit)
    }

    /// Applies a field edit to one task and re-derives.
    ///
    /// # Errors
    /// Returns `TaskOutOfRange` for a bad index, or `MissingField` for a
    /// blank description.
    pub fn edit_task(&mut self, index: usize, edit: &TaskEdit) -> Result<RequestStatus, EngineError> {
        let BillingMode::Itemised(tasks) = &mut self.billing else {
            return Err(EngineError::TaskOutOfRange { index, len: 0 });
        };
        let len = tasks.len();
        let task = tasks
            .get_mut(index)
            .ok_or(EngineError::TaskOutOfRange { index, len })?;
        edit.apply_to(task)?;
        Ok(self.refresh_status())
    }

    /// Authorises the whole request.
    ///
    /// Itemised requests authorise every task; flat-rate requests take the
    /// status directly.
    pub fn approve_all(&mut self) -> RequestStatus {
        self.set_everything(TaskStatus::Authorised)
    }

    /// Declines the whole request.
    pub fn decline_all(&mut self) -> RequestStatus {
        self.set_everything(TaskStatus::Declined)
    }

    fn set_everything(&mut self, status: TaskStatus) -> RequestStatus {
        match &mut self.billing {
            BillingMode::Itemised(tasks) => {
                if let Ok(derived) = set_all(tasks, status) {
                    self.status = derived;
                }
            }
            BillingMode::FlatRate(_) => self.status = RequestStatus::from(status),
        }
        self.refresh_status()
    }

    /// Sets the status of a flat-rate request.
    ///
    /// # Errors
    /// Returns `StatusIsDerived` for itemised requests.
    pub fn set_status(&mut self, status: RequestStatus) -> Result<(), EngineError> {
        if self.is_itemised() {
            return Err(EngineError::StatusIsDerived(self.id));
        }
        self.status = status;
        Ok(())
    }

    /// Applies a partial update.
    ///
    /// A replacement task list switches the billing mode to match it. When the
    /// result is itemised, any supplied status is ignored in favour of the
    /// derived one.
    pub fn apply_patch(&mut self, patch: RequestPatch) -> RequestStatus {
        if let Some(tasks) = patch.tasks {
            let overall = self.billing.overall_labour_hours();
            self.billing = BillingMode::from_parts(tasks, overall);
        }
        if let Some(status) = patch.status {
            if !self.is_itemised() {
                self.status = status;
            }
        }
        self.refresh_status()
    }
}
