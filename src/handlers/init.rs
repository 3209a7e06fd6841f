//! Handler for the `init` command.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use techdash::engine::db::Db;

/// Creates the request database (idempotent).
///
/// # Errors
/// Returns error if the directory or schema cannot be created.
pub fn handle(db: &Path) -> Result<()> {
    Db::init(db)?;
    println!(
        "{} Request database ready at {}",
        "✓".green(),
        db.display().to_string().cyan()
    );
    Ok(())
}
