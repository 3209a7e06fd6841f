//! Handler for the `show` command.

use super::{fmt_hours, resolve, status_badge, RequestView};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::{BillingMode, Request, RequestStatus, TaskStatus};

/// Shows one request, its tasks and why it has its status.
///
/// # Errors
/// Returns error if the request cannot be resolved.
pub fn handle(db: &Path, request_ref: &str, json: bool, strict: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let request = resolve(&conn, request_ref, strict)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&RequestView::new(&request))?);
        return Ok(());
    }

    println!(
        "{} #{} [{}] {}",
        "Request".bold(),
        request.id,
        request.vehicle_job_id.yellow(),
        request.registration.bold()
    );
    println!("  Work:      {}", request.work_description);
    println!("  Status:    {}", status_badge(request.status));
    println!("  Submitted: {}", request.created_at.dimmed());
    println!("  Updated:   {}", request.updated_at.dimmed());

    match &request.billing {
        BillingMode::Itemised(tasks) => {
            println!("\n  {}", "Tasks:".bold());
            for (i, task) in tasks.iter().enumerate() {
                let parts = if task.parts_required { " +parts" } else { "" };
                println!(
                    "  {:>3}. {:<40} {:>5} hrs{} {}",
                    i + 1,
                    task.description,
                    fmt_hours(task.hours()),
                    parts.cyan(),
                    status_badge(RequestStatus::from(task.status))
                );
            }
        }
        BillingMode::FlatRate(Some(hours)) => {
            println!("\n  Overall labour: {} hrs", fmt_hours(*hours));
        }
        BillingMode::FlatRate(None) => {
            println!("\n  {}", "No labour figure given".dimmed());
        }
    }

    println!(
        "\n  Approved {} / requested {} hrs",
        fmt_hours(request.approved_hours()).green(),
        fmt_hours(request.requested_hours())
    );
    println!("  {} {}", "Reason:".dimmed(), explain(&request).dimmed());
    Ok(())
}

/// One-line account of how the status was reached.
fn explain(request: &Request) -> String {
    let tasks = request.tasks();
    if tasks.is_empty() {
        return "set directly (billed by overall labour)".to_string();
    }
    let count = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
    match request.status {
        RequestStatus::Declined => "every task declined".to_string(),
        RequestStatus::AwaitingCustomerResponse => format!(
            "{} task(s) awaiting the customer",
            count(TaskStatus::AwaitingCustomerResponse)
        ),
        RequestStatus::Authorised => "every task authorised".to_string(),
        RequestStatus::PartiallyAuthorised => format!(
            "{} of {} tasks authorised",
            count(TaskStatus::Authorised),
            tasks.len()
        ),
        RequestStatus::Pending | RequestStatus::Unrecognised => {
            "no task authorised yet".to_string()
        }
    }
}
