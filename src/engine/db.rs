//! Database bootstrap: opening the SQLite file and applying the schema.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub struct Db;

impl Db {
    /// Creates the database file (and its directory) and applies the schema.
    ///
    /// # Errors
    /// Returns error if directory creation, DB opening, or migration fails.
    pub fn init(path: &Path) -> Result<Connection> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        let conn = Self::open(path)?;
        Self::migrate(&conn)?;
        tracing::info!(path = %path.display(), "database initialised");
        Ok(conn)
    }

    /// Connects to an existing database.
    ///
    /// # Errors
    /// Returns error if the database file does not exist or cannot be opened.
    pub fn connect(path: &Path) -> Result<Connection> {
        if !path.exists() {
            bail!(
                "No request database at {}. Run `techdash init` first.",
                path.display()
            );
        }
        let conn = Self::open(path)?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// # Errors
    /// Returns error if migration fails.
    pub fn in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    fn open(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(conn)
    }

    /// Applies the schema migrations. Safe to run repeatedly.
    ///
    /// # Errors
    /// Returns error if a table cannot be created.
    pub fn migrate(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vehicle_job_id TEXT NOT NULL,
                registration TEXT NOT NULL,
                work_description TEXT NOT NULL,
                status TEXT NOT NULL,
                overall_labour_hours REAL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create requests table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                request_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                description TEXT NOT NULL,
                estimated_hours REAL NOT NULL DEFAULT 0,
                parts_required INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                FOREIGN KEY(request_id) REFERENCES requests(id) ON DELETE CASCADE
            )",
            [],
        )
        .context("Failed to create tasks table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_request ON tasks (request_id, position)",
            [],
        )
        .context("Failed to create tasks index")?;

        Ok(())
    }
}
