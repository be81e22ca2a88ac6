//! Schema migrations.
//!
//! Each migration is a versioned SQL script compiled into the binary.
//! Applied versions are recorded in `schema_migrations`; `run_all`
//! executes whatever the stored version is still missing.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    name: &'static str,
    ddl: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_batches",
        ddl: include_str!("sql/001_create_batches.sql"),
    },
    Migration {
        version: 2,
        name: "create_file_jobs",
        ddl: include_str!("sql/002_create_file_jobs.sql"),
    },
];

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )?;

    let applied = applied_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        log::info!(
            "Applying schema migration v{} ({})",
            migration.version,
            migration.name
        );

        conn.execute_batch(migration.ddl)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, Utc::now().to_rfc3339()],
        )?;
    }

    Ok(())
}

/// Highest migration version recorded so far, 0 on a fresh database.
fn applied_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}
