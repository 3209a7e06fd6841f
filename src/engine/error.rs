//! Engine errors.
//!
//! Storage failures travel as `anyhow` errors from the repositories; this enum
//! covers contract violations and boundary validation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `derive_status` was handed an empty task list. Callers must branch on
    /// emptiness and use the request's stored status instead.
    #[error("invalid argument: cannot derive a request status from an empty task list")]
    EmptyTaskList,

    #[error("unknown status `{0}`")]
    UnknownStatus(String),

    #[error("{field} must not be empty")]
    MissingField { field: &'static str },

    #[error("task index {index} is out of range (request has {len} tasks)")]
    TaskOutOfRange { index: usize, len: usize },

    #[error("request {0} is billed by task; its status is derived and cannot be set directly")]
    StatusIsDerived(i64),

    #[error("request {0} not found")]
    RequestNotFound(i64),
}
