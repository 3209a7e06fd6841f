//! Handler for the `approve` and `decline` commands.

use super::{fmt_hours, resolve, status_badge};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Decline,
}

/// Authorises or declines a whole request.
///
/// # Errors
/// Returns error if the request cannot be resolved or saved.
pub fn handle(db: &Path, request_ref: &str, decision: Decision, strict: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let mut request = resolve(&conn, request_ref, strict)?;

    match decision {
        Decision::Approve => request.approve_all(),
        Decision::Decline => request.decline_all(),
    };
    RequestRepo::new(&conn).save(&mut request)?;

    let mark = match decision {
        Decision::Approve => "✓".green(),
        Decision::Decline => "✗".red(),
    };
    println!(
        "{} #{} [{}] is now {} ({} hrs approved)",
        mark,
        request.id,
        request.vehicle_job_id.yellow(),
        status_badge(request.status),
        fmt_hours(request.approved_hours())
    );
    Ok(())
}
