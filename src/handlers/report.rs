//! Handler for the `report` command.

use super::{fmt_hours, status_badge};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;
use techdash::{LabourSummary, RequestStatus};

/// Prints approved and requested hours with per-status counts.
///
/// # Errors
/// Returns error if the database query fails.
pub fn handle(db: &Path, json: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let requests = RequestRepo::new(&conn).list()?;
    let summary = LabourSummary::from_requests(&requests);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Labour".bold());
    println!("  Approved:  {} hrs", fmt_hours(summary.approved_hours).green());
    println!("  Requested: {} hrs", fmt_hours(summary.requested_hours));

    let counts = &summary.counts;
    println!("\n{} ({})", "Requests".bold(), counts.total());
    let rows = [
        (RequestStatus::Pending, counts.pending),
        (RequestStatus::AwaitingCustomerResponse, counts.awaiting_customer_response),
        (RequestStatus::PartiallyAuthorised, counts.partially_authorised),
        (RequestStatus::Authorised, counts.authorised),
        (RequestStatus::Declined, counts.declined),
        (RequestStatus::Unrecognised, counts.unrecognised),
    ];
    for (status, count) in rows {
        if count > 0 || status != RequestStatus::Unrecognised {
            println!("  {:>4}  {}", count, status_badge(status));
        }
    }
    Ok(())
}
