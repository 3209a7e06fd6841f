//! Handler for the `delete` command.

use super::resolve;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;

/// Deletes a request together with its tasks.
///
/// # Errors
/// Returns error if the request cannot be resolved or removed.
pub fn handle(db: &Path, request_ref: &str, strict: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let request = resolve(&conn, request_ref, strict)?;
    RequestRepo::new(&conn).delete(request.id)?;
    println!(
        "{} Deleted request #{} [{}] {}",
        "✓".green(),
        request.id,
        request.vehicle_job_id.yellow(),
        request.registration
    );
    Ok(())
}
