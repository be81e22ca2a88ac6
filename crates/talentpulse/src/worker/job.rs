//! Work items and their results as they move through the pool.

use std::path::PathBuf;

use crate::batch::status::JobStatus;

/// A single document queued for evaluation.
///
/// The id is generated at submission time, before the row exists, so
/// the stored upload can be keyed by it.
#[derive(Debug, Clone)]
pub struct EvalJob {
    /// Job id, shared by the database row and the artifact filenames.
    pub id: String,
    /// Batch this job belongs to.
    pub batch_id: String,
    /// Original client-supplied filename, before sanitization.
    pub filename: String,
    /// Where the uploaded bytes were persisted.
    pub source_path: PathBuf,
}

impl EvalJob {
    pub fn new(id: &str, batch_id: &str, filename: &str, source_path: PathBuf) -> Self {
        Self {
            id: id.to_string(),
            batch_id: batch_id.to_string(),
            filename: filename.to_string(),
            source_path,
        }
    }
}

/// Terminal result of running one job through the pipeline.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: String,
    pub batch_id: String,
    pub filename: String,
    /// Either `Done` or `Error`; the pipeline never emits `Pending`.
    pub status: JobStatus,
    /// Path of the success artifact, present on `Done`.
    pub result_ref: Option<PathBuf>,
    /// Evaluation error message, present on `Error`.
    pub error: Option<String>,
    /// Set when the bookkeeping around the outcome failed (artifact or
    /// row write), even though the evaluation itself is settled.
    pub store_failure: Option<String>,
}

impl JobOutcome {
    /// Successful outcome pointing at the written artifact.
    pub fn done(job: &EvalJob, result_ref: PathBuf) -> Self {
        Self {
            job_id: job.id.clone(),
            batch_id: job.batch_id.clone(),
            filename: job.filename.clone(),
            status: JobStatus::Done,
            result_ref: Some(result_ref),
            error: None,
            store_failure: None,
        }
    }

    /// Failed outcome carrying the error message.
    pub fn failed(job: &EvalJob, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            batch_id: job.batch_id.clone(),
            filename: job.filename.clone(),
            status: JobStatus::Error,
            result_ref: None,
            error: Some(error),
            store_failure: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> EvalJob {
        EvalJob::new(
            "job-1",
            "batch-1",
            "resume.pdf",
            PathBuf::from("/tmp/uploads/batch-1/job-1_resume.pdf"),
        )
    }

    #[test]
    fn test_done_outcome() {
        let job = sample_job();
        let outcome = JobOutcome::done(&job, PathBuf::from("/tmp/results/job-1.json"));

        assert_eq!(outcome.job_id, "job-1");
        assert_eq!(outcome.batch_id, "batch-1");
        assert_eq!(outcome.filename, "resume.pdf");
        assert_eq!(outcome.status, JobStatus::Done);
        assert!(outcome.is_done());
        assert_eq!(
            outcome.result_ref,
            Some(PathBuf::from("/tmp/results/job-1.json"))
        );
        assert!(outcome.error.is_none());
        assert!(outcome.store_failure.is_none());
    }

    #[test]
    fn test_failed_outcome() {
        let job = sample_job();
        let outcome = JobOutcome::failed(&job, "Unsupported document format: xyz".to_string());

        assert_eq!(outcome.status, JobStatus::Error);
        assert!(!outcome.is_done());
        assert!(outcome.result_ref.is_none());
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unsupported document format: xyz")
        );
    }
}
