//! Batch and job status types plus the pure status aggregator.

use serde::{Deserialize, Serialize};

/// Status of a batch.
///
/// `Running` is a display-only state used while a submission flow is
/// actively dispatching; it is never written to the database.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Running,
    Partial,
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "PENDING",
            BatchStatus::Running => "RUNNING",
            BatchStatus::Partial => "PARTIAL",
            BatchStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single file job. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Done => "DONE",
            JobStatus::Error => "ERROR",
        }
    }

    /// Returns true once the job has reached `Done` or `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a stored batch status, defaulting to `Pending` on unknown input.
pub fn parse_batch_status(s: &str, batch_id: &str) -> BatchStatus {
    match s {
        "PENDING" => BatchStatus::Pending,
        "RUNNING" => BatchStatus::Running,
        "PARTIAL" => BatchStatus::Partial,
        "COMPLETED" => BatchStatus::Completed,
        other => {
            log::warn!(
                "Unknown batch status '{}' for batch {}, defaulting to PENDING",
                other,
                batch_id
            );
            BatchStatus::Pending
        }
    }
}

/// Parses a stored job status, defaulting to `Pending` on unknown input.
pub fn parse_job_status(s: &str, job_id: &str) -> JobStatus {
    match s {
        "PENDING" => JobStatus::Pending,
        "DONE" => JobStatus::Done,
        "ERROR" => JobStatus::Error,
        other => {
            log::warn!(
                "Unknown job status '{}' for job {}, defaulting to PENDING",
                other,
                job_id
            );
            JobStatus::Pending
        }
    }
}

/// Derives a batch's stored status from its counters.
///
/// Pure function shared by the `mark_done` transaction and any caller
/// that needs a display status. `completed_files` counts successfully
/// finished jobs, so a batch with failed jobs settles at `Partial`.
pub fn derive_batch_status(total_files: i64, completed_files: i64) -> BatchStatus {
    if completed_files <= 0 {
        BatchStatus::Pending
    } else if completed_files >= total_files {
        BatchStatus::Completed
    } else {
        BatchStatus::Partial
    }
}
