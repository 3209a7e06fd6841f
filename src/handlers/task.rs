//! Handler for the `task` command.

use super::{fmt_hours, resolve, status_badge};
use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;
use techdash::TaskEdit;

/// Edits one task (1-based `index`) and saves the re-derived request.
///
/// # Errors
/// Returns error if nothing was asked to change, the index is out of range,
/// or the request cannot be resolved.
pub fn handle(db: &Path, request_ref: &str, index: usize, edit: &TaskEdit, strict: bool) -> Result<()> {
    if edit.is_empty() {
        bail!("Nothing to change. Pass --status, --hours, --description or --parts.");
    }
    if index == 0 {
        bail!("Task numbers start at 1");
    }

    let conn = Db::connect(db)?;
    let mut request = resolve(&conn, request_ref, strict)?;
    let before = request.status;
    request.edit_task(index - 1, edit)?;
    RequestRepo::new(&conn).save(&mut request)?;

    let task = &request.tasks()[index - 1];
    println!(
        "{} Task {} of #{}: {} ({} hrs, {})",
        "✓".green(),
        index,
        request.id,
        task.description,
        fmt_hours(task.hours()),
        task.status
    );
    if before == request.status {
        println!("   Request is still {}", status_badge(request.status));
    } else {
        println!(
            "   Request {} → {}",
            status_badge(before),
            status_badge(request.status)
        );
    }
    Ok(())
}
