//! Vehicle repair authorisation: status derivation and labour totals.

pub mod config;
pub mod engine;

pub use engine::error::EngineError;
pub use engine::labour::{approved_hours, requested_hours, total_hours, LabourSummary, StatusCounts};
pub use engine::state::{approve_all, decline_all, derive_status};
pub use engine::types::{
    BillingMode, NewRequest, Request, RequestPatch, RequestStatus, Task, TaskEdit, TaskStatus,
};
