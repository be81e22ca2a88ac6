//! Batch repository — CRUD operations for the `batches` table.

use rusqlite::{params, Row};
use serde::Serialize;

use crate::batch::status::{parse_batch_status, BatchStatus};

use super::{Database, DatabaseError};

/// Default cap on `list_recent` results.
pub const RECENT_BATCH_LIMIT: u32 = 200;

/// A raw batch row from the database.
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub id: String,
    pub created_at: String,
    pub status: String,
    pub total_files: i64,
    pub completed_files: i64,
}

impl BatchRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            status: row.get("status")?,
            total_files: row.get("total_files")?,
            completed_files: row.get("completed_files")?,
        })
    }
}

/// Point-in-time progress snapshot for a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Batch identifier.
    pub batch_id: String,
    /// Stored batch status.
    pub status: BatchStatus,
    /// Number of files submitted with the batch.
    pub total_files: i64,
    /// Number of files evaluated successfully so far.
    pub completed_files: i64,
}

impl BatchProgress {
    fn from_batch_row(row: &BatchRow) -> Self {
        Self {
            batch_id: row.id.clone(),
            status: parse_batch_status(&row.status, &row.id),
            total_files: row.total_files,
            completed_files: row.completed_files,
        }
    }
}

/// Inserts a new batch row.
pub fn insert(db: &Database, batch: &BatchRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO batches (id, created_at, status, total_files, completed_files)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                batch.id,
                batch.created_at,
                batch.status,
                batch.total_files,
                batch.completed_files,
            ],
        )?;
        Ok(())
    })
}

/// Finds a batch by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<BatchRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM batches WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], BatchRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Reads a batch's progress snapshot.
///
/// Degrading read: an unknown id or a storage failure logs a warning
/// and yields `None` so viewing surfaces never take the flow down.
pub fn get_progress(db: &Database, batch_id: &str) -> Option<BatchProgress> {
    match find_by_id(db, batch_id) {
        Ok(Some(row)) => Some(BatchProgress::from_batch_row(&row)),
        Ok(None) => {
            log::warn!("Progress requested for unknown batch {}", batch_id);
            None
        }
        Err(e) => {
            log::warn!("Failed to read progress for batch {}: {}", batch_id, e);
            None
        }
    }
}

/// Lists recent batches, newest first. Degrades to empty on failure.
pub fn list_recent(db: &Database, limit: Option<u32>) -> Vec<BatchRow> {
    let limit = limit.unwrap_or(RECENT_BATCH_LIMIT);
    match fetch_recent(db, limit) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("Failed to list recent batches: {}", e);
            Vec::new()
        }
    }
}

fn fetch_recent(db: &Database, limit: u32) -> Result<Vec<BatchRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM batches ORDER BY created_at DESC LIMIT ?1")?;
        let rows: Vec<BatchRow> = stmt
            .query_map(params![limit], BatchRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
