//! Batch submission flow: registers a batch and its file jobs, fans
//! the jobs out to the worker pool and drains their outcomes.
//!
//! Validation happens before anything is written. Once dispatch has
//! started, individual job failures settle as ERROR rows and never
//! fail the submission itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::batch::progress::{NoopProgress, ProgressReporter};
use crate::batch::status::{derive_batch_status, BatchStatus, JobStatus};
use crate::broadcast::batch_progress::BatchProgressEvent;
use crate::config;
use crate::db::batch_repo::{self, BatchProgress, BatchRow};
use crate::db::job_repo::{self, FileJobRow};
use crate::db::Database;
use crate::error::{ConfigError, WorkerError};
use crate::evaluator::Evaluator;
use crate::extract::ExtractorRegistry;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::storage::{sha256_hex, ResultStore, UploadStore};
use crate::worker::{EvalJob, JobOutcome, WorkerPool};

/// An uploaded document: the client-supplied filename plus raw bytes.
#[derive(Debug, Clone)]
pub struct BatchDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

impl BatchDocument {
    pub fn new(filename: &str, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.to_string(),
            content: content.into(),
        }
    }
}

/// Everything `submit` knows once the batch has settled.
#[derive(Debug)]
pub struct BatchReport {
    pub batch_id: String,
    /// Final counters and status as stored.
    pub progress: BatchProgress,
    /// Per-job outcomes in the order they arrived.
    pub outcomes: Vec<JobOutcome>,
}

/// Drives a batch from upload to settled outcome.
///
/// Every collaborator is injected; the runner owns no global state and
/// several runners can share one database handle.
pub struct BatchRunner {
    database: Database,
    uploads: UploadStore,
    results: ResultStore,
    extractor: Arc<ExtractorRegistry>,
    evaluator: Arc<dyn Evaluator>,
    reporter: Arc<dyn ProgressReporter>,
    worker_count: usize,
    oracle_timeout: Duration,
}

impl BatchRunner {
    pub fn new(
        database: Database,
        uploads: UploadStore,
        results: ResultStore,
        extractor: Arc<ExtractorRegistry>,
        evaluator: Arc<dyn Evaluator>,
        worker_count: usize,
        oracle_timeout: Duration,
    ) -> Self {
        Self::with_reporter(
            database,
            uploads,
            results,
            extractor,
            evaluator,
            worker_count,
            oracle_timeout,
            Arc::new(NoopProgress),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_reporter(
        database: Database,
        uploads: UploadStore,
        results: ResultStore,
        extractor: Arc<ExtractorRegistry>,
        evaluator: Arc<dyn Evaluator>,
        worker_count: usize,
        oracle_timeout: Duration,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            database,
            uploads,
            results,
            extractor,
            evaluator,
            reporter,
            worker_count,
            oracle_timeout,
        }
    }

    /// Evaluates a batch of documents against one job description.
    ///
    /// Blocks until every job has settled. Returns an error only for
    /// rejected input or a failure while registering the batch; job
    /// failures after dispatch land in the report instead.
    pub fn submit(
        &self,
        documents: Vec<BatchDocument>,
        job_description: &str,
    ) -> crate::error::Result<BatchReport> {
        if documents.is_empty() {
            return Err(ConfigError::NoDocuments.into());
        }
        if job_description.trim().is_empty() {
            return Err(ConfigError::EmptyJobDescription.into());
        }
        config::validate_worker_count(self.worker_count)?;

        let batch_id = Uuid::new_v4().to_string();
        let total_files = documents.len() as i64;
        batch_repo::insert(
            &self.database,
            &BatchRow {
                id: batch_id.clone(),
                created_at: Utc::now().to_rfc3339(),
                status: BatchStatus::Pending.as_str().to_string(),
                total_files,
                completed_files: 0,
            },
        )?;

        info!(
            "Registered batch {} with {} documents",
            batch_id, total_files
        );

        let jobs = self.register_jobs(&batch_id, &documents, total_files)?;

        let pipeline_config = Arc::new(PipelineConfig::new(job_description, self.oracle_timeout));
        let pipeline = Arc::new(Pipeline::new(
            pipeline_config,
            self.database.clone(),
            self.results.clone(),
            Arc::clone(&self.extractor),
            Arc::clone(&self.evaluator),
        ));
        let pool = WorkerPool::new(pipeline, self.worker_count);

        for job in jobs {
            pool.submit(job)?;
        }

        let expected = documents.len();
        let mut outcomes: Vec<JobOutcome> = Vec::with_capacity(expected);
        while outcomes.len() < expected {
            match pool.recv_outcome() {
                Some(outcome) => {
                    self.report_outcome(&outcome, total_files);
                    outcomes.push(outcome);
                }
                None => {
                    let received = outcomes.len();
                    pool.wait();
                    return Err(WorkerError::MissingOutcomes { expected, received }.into());
                }
            }
        }

        pool.wait();

        let progress = batch_repo::get_progress(&self.database, &batch_id)
            .unwrap_or_else(|| derived_progress(&batch_id, total_files, &outcomes));

        info!(
            "Batch {} settled as {} ({}/{} evaluated)",
            batch_id,
            progress.status.as_str(),
            progress.completed_files,
            progress.total_files
        );

        Ok(BatchReport {
            batch_id,
            progress,
            outcomes,
        })
    }

    /// Persists every document and its job row, emitting a queued
    /// event per job. Runs before any worker exists.
    fn register_jobs(
        &self,
        batch_id: &str,
        documents: &[BatchDocument],
        total_files: i64,
    ) -> crate::error::Result<Vec<EvalJob>> {
        let mut jobs = Vec::with_capacity(documents.len());

        for document in documents {
            let job_id = Uuid::new_v4().to_string();
            let checksum = sha256_hex(&document.content);
            let stored_path =
                self.uploads
                    .store(batch_id, &job_id, &document.filename, &document.content)?;

            let now = Utc::now().to_rfc3339();
            job_repo::insert(
                &self.database,
                &FileJobRow {
                    id: job_id.clone(),
                    batch_id: batch_id.to_string(),
                    filename: document.filename.clone(),
                    source_path: stored_path.display().to_string(),
                    content_checksum: checksum,
                    status: JobStatus::Pending.as_str().to_string(),
                    result_ref: None,
                    error_detail: None,
                    created_at: now.clone(),
                    updated_at: now,
                },
            )?;

            self.reporter.report(BatchProgressEvent::queued(
                batch_id,
                &job_id,
                &document.filename,
                total_files,
            ));

            jobs.push(EvalJob::new(
                &job_id,
                batch_id,
                &document.filename,
                stored_path,
            ));
        }

        Ok(jobs)
    }

    /// Emits the terminal event for one outcome with fresh counters.
    fn report_outcome(&self, outcome: &JobOutcome, total_files: i64) {
        let completed_so_far = batch_repo::get_progress(&self.database, &outcome.batch_id)
            .map(|p| p.completed_files)
            .unwrap_or(0);

        if let Some(failure) = &outcome.store_failure {
            warn!(
                "Job {} settled with store failure: {}",
                outcome.job_id, failure
            );
        }

        let result_ref = outcome
            .result_ref
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let event = match outcome.status {
            JobStatus::Done => BatchProgressEvent::done(
                &outcome.batch_id,
                &outcome.job_id,
                &outcome.filename,
                &result_ref,
                completed_so_far,
                total_files,
            ),
            _ => BatchProgressEvent::failed(
                &outcome.batch_id,
                &outcome.job_id,
                &outcome.filename,
                outcome.error.as_deref().unwrap_or("unknown error"),
                completed_so_far,
                total_files,
            ),
        };
        self.reporter.report(event);
    }
}

/// Fallback when the final progress read degrades: counters derived
/// from the outcomes actually received.
fn derived_progress(batch_id: &str, total_files: i64, outcomes: &[JobOutcome]) -> BatchProgress {
    let completed_files = outcomes.iter().filter(|o| o.is_done()).count() as i64;
    BatchProgress {
        batch_id: batch_id.to_string(),
        status: derive_batch_status(total_files, completed_files),
        total_files,
        completed_files,
    }
}
