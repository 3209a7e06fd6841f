//! Core types for Tech Dash.
//!
//! Note: a request's status is computed by `state::derive_status()` whenever
//! the request is billed by task. `Request::status` is the cached result.

use super::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorisation status of a single task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Authorised,
    Declined,
    AwaitingCustomerResponse,
    /// A stored label that matched nothing in the taxonomy.
    #[serde(other)]
    Unrecognised,
}

impl TaskStatus {
    /// Every status a caller may assign.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Authorised,
        Self::Declined,
        Self::AwaitingCustomerResponse,
    ];

    /// Storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorised => "authorised",
            Self::Declined => "declined",
            Self::AwaitingCustomerResponse => "awaiting_customer_response",
            Self::Unrecognised => "unrecognised",
        }
    }

    /// Returns true if this status satisfies `filter`.
    ///
    /// `Unrecognised` never matches, not even itself.
    #[must_use]
    pub fn matches(self, filter: TaskStatus) -> bool {
        self != Self::Unrecognised && self == filter
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Authorised => write!(f, "Authorised"),
            Self::Declined => write!(f, "Declined"),
            Self::AwaitingCustomerResponse => write!(f, "Awaiting customer response"),
            Self::Unrecognised => write!(f, "Unrecognised"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_label(s).as_str() {
            "pending" => Ok(Self::Pending),
            "authorised" | "authorized" | "approved" => Ok(Self::Authorised),
            "declined" => Ok(Self::Declined),
            "awaiting_customer_response" | "awaiting_customer_contact" | "awaiting" => {
                Ok(Self::AwaitingCustomerResponse)
            }
            _ => Err(EngineError::UnknownStatus(s.to_string())),
        }
    }
}

impl From<String> for TaskStatus {
    /// Lenient conversion for stored values.
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Unrecognised)
    }
}

/// Overall authorisation status of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Authorised,
    PartiallyAuthorised,
    Declined,
    AwaitingCustomerResponse,
    #[serde(other)]
    Unrecognised,
}

impl RequestStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Authorised,
        Self::PartiallyAuthorised,
        Self::Declined,
        Self::AwaitingCustomerResponse,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorised => "authorised",
            Self::PartiallyAuthorised => "partially_authorised",
            Self::Declined => "declined",
            Self::AwaitingCustomerResponse => "awaiting_customer_response",
            Self::Unrecognised => "unrecognised",
        }
    }

    /// Returns true while the request still has hours waiting on a decision.
    ///
    /// Fully authorised requests are excluded so their hours are not counted
    /// as both approved and requested.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Declined | Self::AwaitingCustomerResponse | Self::PartiallyAuthorised
        )
    }

    /// Returns true if this request status equals the given task status.
    ///
    /// Used to gate flat-rate requests, which have no per-task statuses.
    #[must_use]
    pub fn matches(self, filter: TaskStatus) -> bool {
        filter != TaskStatus::Unrecognised && self == RequestStatus::from(filter)
    }

    /// Returns the display color hint for UI rendering.
    #[must_use]
    pub fn color_hint(self) -> &'static str {
        match self {
            Self::Authorised => "green",
            Self::Declined => "red",
            Self::PartiallyAuthorised => "yellow",
            Self::AwaitingCustomerResponse => "orange",
            Self::Pending | Self::Unrecognised => "gray",
        }
    }
}

impl From<TaskStatus> for RequestStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => Self::Pending,
            TaskStatus::Authorised => Self::Authorised,
            TaskStatus::Declined => Self::Declined,
            TaskStatus::AwaitingCustomerResponse => Self::AwaitingCustomerResponse,
            TaskStatus::Unrecognised => Self::Unrecognised,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Authorised => write!(f, "Authorised"),
            Self::PartiallyAuthorised => write!(f, "Partially authorised"),
            Self::Declined => write!(f, "Declined"),
            Self::AwaitingCustomerResponse => write!(f, "Awaiting customer response"),
            Self::Unrecognised => write!(f, "Unrecognised"),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_label(s).as_str() {
            "partially_authorised" | "partially_authorized" | "partially_approved" | "partial" => {
                Ok(Self::PartiallyAuthorised)
            }
            _ => s.parse::<TaskStatus>().map(Self::from),
        }
    }
}

impl From<String> for RequestStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Unrecognised)
    }
}

/// Lowercases and joins words with `_` so "Partially approved",
/// "partially-approved" and "PARTIALLY_APPROVED" compare equal.
fn normalise_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Clamps an hour figure into `[0, inf)`. NaN and infinities become zero.
#[must_use]
pub fn clamp_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}

/// Parses free-form hour input, coercing anything unusable to zero.
#[must_use]
pub fn coerce_hours(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map_or(0.0, clamp_hours)
}

/// One billable line item on a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    /// Raw estimate as supplied; clamped when summed (see `hours()`).
    pub estimated_hours: f64,
    #[serde(default)]
    pub parts_required: bool,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    #[must_use]
    pub fn new(description: impl Into<String>, estimated_hours: f64) -> Self {
        Self {
            description: description.into(),
            estimated_hours,
            parts_required: false,
            status: TaskStatus::Pending,
        }
    }

    #[must_use]
    pub fn with_parts(mut self, parts_required: bool) -> Self {
        self.parts_required = parts_required;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// The estimate as it counts towards totals.
    #[must_use]
    pub fn hours(&self) -> f64 {
        clamp_hours(self.estimated_hours)
    }
}

/// Field-level edit of a task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub description: Option<String>,
    pub estimated_hours: Option<f64>,
    pub parts_required: Option<bool>,
    pub status: Option<TaskStatus>,
}

impl TaskEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.estimated_hours.is_none()
            && self.parts_required.is_none()
            && self.status.is_none()
    }

    /// Applies the edit. Hours are clamped on entry.
    ///
    /// # Errors
    /// Returns `MissingField` if the new description is blank; the task is
    /// left unchanged in that case.
    pub fn apply_to(&self, task: &mut Task) -> Result<(), EngineError> {
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(EngineError::MissingField {
                    field: "task description",
                });
            }
        }
        if let Some(description) = &self.description {
            task.description = description.trim().to_string();
        }
        if let Some(hours) = self.estimated_hours {
            task.estimated_hours = clamp_hours(hours);
        }
        if let Some(parts) = self.parts_required {
            task.parts_required = parts;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        Ok(())
    }
}

/// How a request is billed: per task, or as one overall labour figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum BillingMode {
    Itemised(Vec<Task>),
    FlatRate(Option<f64>),
}

impl BillingMode {
    /// Picks the billing mode from submitted fields. A non-empty task list
    /// always wins; the overall figure is dropped.
    #[must_use]
    pub fn from_parts(tasks: Vec<Task>, overall_labour_hours: Option<f64>) -> Self {
        if tasks.is_empty() {
            Self::FlatRate(overall_labour_hours)
        } else {
            Self::Itemised(tasks)
        }
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        match self {
            Self::Itemised(tasks) => tasks,
            Self::FlatRate(_) => &[],
        }
    }

    /// The overall figure, only meaningful for flat-rate billing.
    #[must_use]
    pub fn overall_labour_hours(&self) -> Option<f64> {
        match self {
            Self::Itemised(_) => None,
            Self::FlatRate(hours) => *hours,
        }
    }

    #[must_use]
    pub fn is_itemised(&self) -> bool {
        !self.tasks().is_empty()
    }
}

/// A stored repair authorisation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    /// Workshop job number ("WIP").
    pub vehicle_job_id: String,
    pub registration: String,
    pub work_description: String,
    pub billing: BillingMode,
    /// Cached status (see `state::derive_status()` for itemised requests)
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Request {
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.billing.tasks()
    }

    #[must_use]
    pub fn is_itemised(&self) -> bool {
        self.billing.is_itemised()
    }
}

/// A request being authored, before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    pub vehicle_job_id: String,
    pub registration: String,
    pub work_description: String,
    #[serde(default)]
    pub overall_labour_hours: Option<f64>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl NewRequest {
    #[must_use]
    pub fn new(
        vehicle_job_id: impl Into<String>,
        registration: impl Into<String>,
        work_description: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_job_id: vehicle_job_id.into(),
            registration: registration.into(),
            work_description: work_description.into(),
            overall_labour_hours: None,
            tasks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_overall_labour(mut self, hours: f64) -> Self {
        self.overall_labour_hours = Some(clamp_hours(hours));
        self
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// # Errors
    /// Returns `TaskOutOfRange` for a bad index, or `MissingField` for a
    /// blank description.
    pub fn update_task(&mut self, index: usize, edit: &TaskEdit) -> Result<(), EngineError> {
        let len = self.tasks.len();
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(EngineError::TaskOutOfRange { index, len })?;
        edit.apply_to(task)
    }

    /// # Errors
    /// Returns `TaskOutOfRange` for a bad index.
    pub fn remove_task(&mut self, index: usize) -> Result<Task, EngineError> {
        if index >= self.tasks.len() {
            return Err(EngineError::TaskOutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        Ok(self.tasks.remove(index))
    }

    /// Checks the fields required for submission.
    ///
    /// # Errors
    /// Returns `MissingField` naming the first blank field.
    pub fn validate(&self) -> Result<(), EngineError> {
        let required = [
            ("vehicle job id", &self.vehicle_job_id),
            ("registration", &self.registration),
            ("work description", &self.work_description),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EngineError::MissingField { field });
            }
        }
        if self.tasks.iter().any(|t| t.description.trim().is_empty()) {
            return Err(EngineError::MissingField {
                field: "task description",
            });
        }
        Ok(())
    }
}

/// Partial update accepted by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPatch {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_parses_labels_and_keys() {
        assert_eq!("Pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("authorised".parse::<TaskStatus>(), Ok(TaskStatus::Authorised));
        assert_eq!("Declined".parse::<TaskStatus>(), Ok(TaskStatus::Declined));
        assert_eq!(
            "awaiting_customer_response".parse::<TaskStatus>(),
            Ok(TaskStatus::AwaitingCustomerResponse)
        );
        assert_eq!(
            "Awaiting customer response".parse::<TaskStatus>(),
            Ok(TaskStatus::AwaitingCustomerResponse)
        );
    }

    #[test]
    fn test_legacy_spellings_map_to_canonical() {
        assert_eq!(
            "Partially approved".parse::<RequestStatus>(),
            Ok(RequestStatus::PartiallyAuthorised)
        );
        assert_eq!(
            "Awaiting customer contact".parse::<RequestStatus>(),
            Ok(RequestStatus::AwaitingCustomerResponse)
        );
        assert_eq!("Authorized".parse::<RequestStatus>(), Ok(RequestStatus::Authorised));
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert_eq!(
            "closed".parse::<TaskStatus>(),
            Err(EngineError::UnknownStatus("closed".to_string()))
        );
        // Partial is a request-level status only.
        assert!("partially_authorised".parse::<TaskStatus>().is_err());
        assert!("unrecognised".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_lenient_conversion_marks_unknown() {
        assert_eq!(TaskStatus::from("on hold".to_string()), TaskStatus::Unrecognised);
        assert_eq!(RequestStatus::from(String::new()), RequestStatus::Unrecognised);
        assert_eq!(
            RequestStatus::from("Partially approved".to_string()),
            RequestStatus::PartiallyAuthorised
        );
    }

    #[test]
    fn test_storage_key_round_trips() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
        for status in RequestStatus::ALL {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
            assert_eq!(status.to_string().parse::<RequestStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unrecognised_never_matches() {
        assert!(!TaskStatus::Unrecognised.matches(TaskStatus::Unrecognised));
        assert!(!RequestStatus::Unrecognised.matches(TaskStatus::Unrecognised));
        assert!(TaskStatus::Declined.matches(TaskStatus::Declined));
        assert!(RequestStatus::Authorised.matches(TaskStatus::Authorised));
        assert!(!RequestStatus::PartiallyAuthorised.matches(TaskStatus::Authorised));
    }

    #[test]
    fn test_open_statuses() {
        assert!(RequestStatus::Pending.is_open());
        assert!(RequestStatus::Declined.is_open());
        assert!(RequestStatus::AwaitingCustomerResponse.is_open());
        assert!(RequestStatus::PartiallyAuthorised.is_open());
        assert!(!RequestStatus::Authorised.is_open());
        assert!(!RequestStatus::Unrecognised.is_open());
    }

    #[test]
    fn test_hours_coercion() {
        assert_eq!(coerce_hours("1.5"), 1.5);
        assert_eq!(coerce_hours(" 2 "), 2.0);
        assert_eq!(coerce_hours("-3"), 0.0);
        assert_eq!(coerce_hours("abc"), 0.0);
        assert_eq!(coerce_hours(""), 0.0);
        assert_eq!(coerce_hours("NaN"), 0.0);
        assert_eq!(clamp_hours(f64::INFINITY), 0.0);
        assert_eq!(clamp_hours(-0.0), 0.0);
    }

    #[test]
    fn test_billing_mode_prefers_tasks() {
        let billing = BillingMode::from_parts(vec![Task::new("Brake pads", 1.0)], Some(4.0));
        assert!(billing.is_itemised());
        assert_eq!(billing.overall_labour_hours(), None);

        let flat = BillingMode::from_parts(Vec::new(), Some(2.0));
        assert!(!flat.is_itemised());
        assert_eq!(flat.overall_labour_hours(), Some(2.0));
    }

    #[test]
    fn test_draft_task_editing() {
        let mut draft = NewRequest::new("W100", "AB12 CDE", "Service");
        draft.add_task(Task::new("Oil change", 0.5));
        draft.add_task(Task::new("Tyres", 1.0));

        let edit = TaskEdit {
            estimated_hours: Some(-2.0),
            parts_required: Some(true),
            ..TaskEdit::default()
        };
        draft.update_task(1, &edit).unwrap();
        assert_eq!(draft.tasks[1].estimated_hours, 0.0);
        assert!(draft.tasks[1].parts_required);

        let removed = draft.remove_task(0).unwrap();
        assert_eq!(removed.description, "Oil change");
        assert_eq!(draft.tasks.len(), 1);

        assert_eq!(
            draft.remove_task(5),
            Err(EngineError::TaskOutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_blank_description_edit_is_rejected() {
        let mut task = Task::new("Wipers", 0.2);
        let edit = TaskEdit {
            description: Some("   ".to_string()),
            estimated_hours: Some(1.0),
            ..TaskEdit::default()
        };
        assert!(edit.apply_to(&mut task).is_err());
        assert_eq!(task.estimated_hours, 0.2);
    }

    #[test]
    fn test_validate_requires_fields() {
        assert!(NewRequest::new("W1", "REG", "Work").validate().is_ok());
        assert_eq!(
            NewRequest::new(" ", "REG", "Work").validate(),
            Err(EngineError::MissingField {
                field: "vehicle job id"
            })
        );
        let mut draft = NewRequest::new("W1", "REG", "Work");
        draft.add_task(Task::new("", 1.0));
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_unknown_status_deserialises_as_unrecognised() {
        let task: Task = serde_json::from_str(
            r#"{"description":"x","estimated_hours":1.0,"status":"on_hold"}"#,
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::Unrecognised);
    }
}
