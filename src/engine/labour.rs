//! Labour Aggregator: hour totals per request and across a request list.
//!
//! Everything here is total: bad numbers clamp to zero and unrecognised
//! statuses simply fail to match a filter.

use super::types::{clamp_hours, BillingMode, Request, RequestStatus, TaskStatus};
use serde::Serialize;

/// Total labour hours on one request, optionally restricted to one status.
///
/// Itemised requests sum the tasks whose status matches `filter`. Flat-rate
/// requests return their overall figure, gated on the request's own status
/// when a filter is given.
#[must_use]
pub fn total_hours(request: &Request, filter: Option<TaskStatus>) -> f64 {
    match &request.billing {
        BillingMode::Itemised(tasks) if !tasks.is_empty() => sum_hours(
            tasks
                .iter()
                .filter(|t| filter.map_or(true, |f| t.status.matches(f)))
                .map(|t| t.hours()),
        ),
        billing => {
            let hours = clamp_hours(billing.overall_labour_hours().unwrap_or(0.0));
            match filter {
                None => hours,
                Some(f) if request.status.matches(f) => hours,
                Some(_) => 0.0,
            }
        }
    }
}

/// Hours authorised across all requests.
#[must_use]
pub fn approved_hours(requests: &[Request]) -> f64 {
    sum_hours(
        requests
            .iter()
            .map(|r| total_hours(r, Some(TaskStatus::Authorised))),
    )
}

/// Hours still waiting on a decision: every hour of every open request.
#[must_use]
pub fn requested_hours(requests: &[Request]) -> f64 {
    sum_hours(
        requests
            .iter()
            .filter(|r| r.status.is_open())
            .map(|r| total_hours(r, None)),
    )
}

/// Sums clamped values in ascending order so the total does not depend on
/// input order. Overflow saturates at `f64::MAX`.
fn sum_hours(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.map(clamp_hours).collect();
    values.sort_by(f64::total_cmp);
    let total: f64 = values.into_iter().sum();
    if total.is_infinite() {
        f64::MAX
    } else {
        clamp_hours(total)
    }
}

/// Convenience accessors used by the presentation layer.
impl Request {
    /// Authorised hours on this request.
    #[must_use]
    pub fn approved_hours(&self) -> f64 {
        total_hours(self, Some(TaskStatus::Authorised))
    }

    /// All hours on this request, regardless of status.
    #[must_use]
    pub fn requested_hours(&self) -> f64 {
        total_hours(self, None)
    }
}

/// Aggregate counts of requests by status.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub authorised: usize,
    pub partially_authorised: usize,
    pub declined: usize,
    pub awaiting_customer_response: usize,
    pub unrecognised: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn from_requests(requests: &[Request]) -> Self {
        let mut counts = Self::default();
        for request in requests {
            match request.status {
                RequestStatus::Pending => counts.pending += 1,
                RequestStatus::Authorised => counts.authorised += 1,
                RequestStatus::PartiallyAuthorised => counts.partially_authorised += 1,
                RequestStatus::Declined => counts.declined += 1,
                RequestStatus::AwaitingCustomerResponse => counts.awaiting_customer_response += 1,
                RequestStatus::Unrecognised => counts.unrecognised += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.pending
            + self.authorised
            + self.partially_authorised
            + self.declined
            + self.awaiting_customer_response
            + self.unrecognised
    }
}

/// Report-level figures for a list of requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabourSummary {
    pub approved_hours: f64,
    pub requested_hours: f64,
    pub counts: StatusCounts,
}

impl LabourSummary {
    #[must_use]
    pub fn from_requests(requests: &[Request]) -> Self {
        Self {
            approved_hours: approved_hours(requests),
            requested_hours: requested_hours(requests),
            counts: StatusCounts::from_requests(requests),
        }
    }
}
