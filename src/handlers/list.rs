//! Handler for the `list` command.

use super::{fmt_hours, paint, RequestView};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;
use techdash::{LabourSummary, Request};

#[derive(Serialize)]
struct ListReport<'a> {
    summary: LabourSummary,
    requests: Vec<RequestView<'a>>,
}

/// Lists every request with its status and hour figures.
///
/// # Errors
/// Returns error if the database query fails.
pub fn handle(db: &Path, json: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let requests = RequestRepo::new(&conn).list()?;
    let summary = LabourSummary::from_requests(&requests);

    if json {
        let report = ListReport {
            summary,
            requests: requests.iter().map(RequestView::new).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if requests.is_empty() {
        println!("{}", "No requests yet. Submit one with `techdash submit`.".dimmed());
        return Ok(());
    }

    println!(
        "{:>4}  {:<10} {:<10} {:<28} {:<28} {:>8} {:>9}",
        "ID", "WIP", "REG", "WORK", "STATUS", "APPROVED", "REQUESTED"
    );
    for request in &requests {
        print_row(request);
    }
    println!("\n{} requests", summary.counts.total());
    println!(
        "Hours approved:  {}",
        fmt_hours(summary.approved_hours).green()
    );
    println!("Hours requested: {}", fmt_hours(summary.requested_hours));
    Ok(())
}

fn print_row(request: &Request) {
    let status = format!("{:<28}", request.status.to_string());
    println!(
        "{:>4}  {:<10} {:<10} {:<28} {} {:>8} {:>9}",
        request.id,
        truncate(&request.vehicle_job_id, 10),
        truncate(&request.registration, 10),
        truncate(&request.work_description, 28),
        paint(request.status, &status),
        fmt_hours(request.approved_hours()),
        fmt_hours(request.requested_hours())
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Brakes", 10), "Brakes");
        assert_eq!(truncate("Front brake pads", 8), "Front b…");
        assert_eq!(truncate("Front brake pads", 8).chars().count(), 8);
    }
}
