//! SQLite-backed persistence for batches and file jobs.
//!
//! One connection per process, shared behind a `Mutex`. SQLite
//! serializes writers anyway, so a single guarded connection keeps the
//! repositories simple while staying safe to use from the worker pool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod batch_repo;
pub mod error;
pub mod job_repo;
pub mod migrations;

pub use error::DatabaseError;

/// Shared handle to the evaluation store.
///
/// Clones share one connection. `with_conn` hands out `&mut Connection`
/// so repositories can open transactions where a multi-statement update
/// has to commit atomically.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database file, creating it and its parent directory on
    /// first use, and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self::from_connection(conn)?;
        log::info!("Database ready at {}", path.display());
        Ok(db)
    }

    /// In-memory database for tests; schema applied, nothing persisted.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the locked connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError>,
    {
        let mut conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&mut conn)
    }
}

/// Canonical on-disk location: `~/.talentpulse/data/talentpulse.db`.
pub fn default_database_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".talentpulse");
    path.push("data");
    path.push("talentpulse.db");
    Some(path)
}
