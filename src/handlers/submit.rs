//! Handler for the `submit` command.

use super::fmt_hours;
use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;
use techdash::engine::repo::RequestRepo;
use techdash::engine::types::coerce_hours;
use techdash::{NewRequest, Task};

/// Submits a new request with optional itemised tasks.
///
/// # Errors
/// Returns error if a task argument is malformed, a required field is blank,
/// or the database is unavailable.
pub fn handle(
    db: &Path,
    wip: &str,
    reg: &str,
    work: &str,
    labour: Option<&str>,
    tasks: &[String],
) -> Result<()> {
    let mut draft = NewRequest::new(wip, reg, work);
    if let Some(raw) = labour {
        draft = draft.with_overall_labour(coerce_hours(raw));
    }
    for raw in tasks {
        draft.add_task(parse_task_arg(raw)?);
    }

    let conn = Db::connect(db)?;
    let request = RequestRepo::new(&conn).create(draft)?;

    println!(
        "{} Submitted request #{} [{}] {}",
        "✓".green(),
        request.id,
        request.vehicle_job_id.yellow(),
        request.registration
    );
    if request.is_itemised() {
        println!(
            "   {} tasks, {} hrs requested",
            request.tasks().len(),
            fmt_hours(request.requested_hours())
        );
    } else {
        println!(
            "   overall labour {} hrs",
            fmt_hours(request.requested_hours())
        );
    }
    Ok(())
}

/// Parses `description[:hours][:parts]`.
///
/// Hours go through `coerce_hours`, so unreadable figures become 0. The
/// description may itself contain colons; only trailing fields are split.
///
/// # Errors
/// Returns error if the description is blank.
pub fn parse_task_arg(raw: &str) -> Result<Task> {
    let (rest, parts) = match raw.rsplit_once(':') {
        Some((head, flag)) if flag.trim().eq_ignore_ascii_case("parts") => (head, true),
        _ => (raw, false),
    };
    let (description, hours) = match rest.rsplit_once(':') {
        Some((head, hours)) => (head, coerce_hours(hours)),
        None => (rest, 0.0),
    };
    let description = description.trim();
    if description.is_empty() {
        bail!("Task '{raw}' has no description");
    }
    Ok(Task::new(description, hours).with_parts(parts))
}
