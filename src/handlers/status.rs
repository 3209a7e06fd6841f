//! Handler for the `status` command.

use super::{resolve, status_badge};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;
use techdash::RequestStatus;

/// Sets the status of a request billed by overall labour.
///
/// # Errors
/// Returns error for itemised requests, whose status is derived from tasks.
pub fn handle(db: &Path, request_ref: &str, status: RequestStatus, strict: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let mut request = resolve(&conn, request_ref, strict)?;

    request.set_status(status)?;
    RequestRepo::new(&conn).save(&mut request)?;

    println!(
        "{} #{} [{}] set to {}",
        "✓".green(),
        request.id,
        request.vehicle_job_id.yellow(),
        status_badge(request.status)
    );
    Ok(())
}
