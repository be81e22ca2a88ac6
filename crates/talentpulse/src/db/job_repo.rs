//! File-job repository — CRUD and terminal-state transitions for the
//! `file_jobs` table.
//!
//! `mark_done` and `mark_error` are the only writers after insertion.
//! Both are guarded so a job leaves `PENDING` exactly once; a second
//! call reports `Ok(false)` and changes nothing.

use rusqlite::{params, Row};

use crate::batch::status::derive_batch_status;

use super::{Database, DatabaseError};

/// A raw file-job row from the database.
#[derive(Debug, Clone)]
pub struct FileJobRow {
    pub id: String,
    pub batch_id: String,
    pub filename: String,
    pub source_path: String,
    pub content_checksum: String,
    pub status: String,
    pub result_ref: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl FileJobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            batch_id: row.get("batch_id")?,
            filename: row.get("filename")?,
            source_path: row.get("source_path")?,
            content_checksum: row.get("content_checksum")?,
            status: row.get("status")?,
            result_ref: row.get("result_ref")?,
            error_detail: row.get("error_detail")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new file-job row.
pub fn insert(db: &Database, job: &FileJobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO file_jobs (id, batch_id, filename, source_path, content_checksum,
             status, result_ref, error_detail, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                job.id,
                job.batch_id,
                job.filename,
                job.source_path,
                job.content_checksum,
                job.status,
                job.result_ref,
                job.error_detail,
                job.created_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a file job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<FileJobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM file_jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], FileJobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Marks a pending job as successfully completed.
///
/// Runs as a single transaction: the row flips to `DONE` with the given
/// `result_ref`, the parent batch's `completed_files` is incremented in
/// SQL (`completed_files + 1`, never read-modify-write in Rust), and the
/// batch status is recomputed from the fresh counts.
///
/// Returns `Ok(false)` without side effects when the job is already in
/// a terminal state or unknown, so a duplicate completion can never
/// double-count.
pub fn mark_done(
    db: &Database,
    job_id: &str,
    result_ref: &str,
    now: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE file_jobs SET status = 'DONE', result_ref = ?2, updated_at = ?3
             WHERE id = ?1 AND status = 'PENDING'",
            params![job_id, result_ref, now],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        let batch_id: String = tx.query_row(
            "SELECT batch_id FROM file_jobs WHERE id = ?1",
            params![job_id],
            |r| r.get(0),
        )?;

        tx.execute(
            "UPDATE batches SET completed_files = completed_files + 1 WHERE id = ?1",
            params![batch_id],
        )?;

        let (total, completed): (i64, i64) = tx.query_row(
            "SELECT total_files, completed_files FROM batches WHERE id = ?1",
            params![batch_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        tx.execute(
            "UPDATE batches SET status = ?2 WHERE id = ?1",
            params![batch_id, derive_batch_status(total, completed).as_str()],
        )?;

        tx.commit()?;
        Ok(true)
    })
}

/// Marks a pending job as failed with an error description.
///
/// Does not advance the parent batch's `completed_files`: only
/// successful evaluations count toward completion, so a batch with
/// failed jobs settles at `PARTIAL` rather than `COMPLETED`.
///
/// Returns `Ok(false)` without side effects when the job is already
/// terminal or unknown.
pub fn mark_error(
    db: &Database,
    job_id: &str,
    message: &str,
    now: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE file_jobs SET status = 'ERROR', error_detail = ?2, updated_at = ?3
             WHERE id = ?1 AND status = 'PENDING'",
            params![job_id, message, now],
        )?;
        Ok(changed > 0)
    })
}

/// Lists a batch's jobs in insertion order. Degrades to empty on failure.
pub fn jobs_for_batch(db: &Database, batch_id: &str) -> Vec<FileJobRow> {
    match fetch_for_batch(db, batch_id) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("Failed to list jobs for batch {}: {}", batch_id, e);
            Vec::new()
        }
    }
}

fn fetch_for_batch(db: &Database, batch_id: &str) -> Result<Vec<FileJobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM file_jobs WHERE batch_id = ?1 ORDER BY rowid")?;
        let rows: Vec<FileJobRow> = stmt
            .query_map(params![batch_id], FileJobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM file_jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
