//! Test harness for isolated batch evaluation runs.
//!
//! The `TestHarness` struct provides a complete isolated environment for
//! exercising the submission flow, including:
//! - Temporary upload and results directories
//! - An in-memory database with migrations applied
//! - A scripted evaluator and a recording progress reporter

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use talentpulse::batch::{BatchDocument, BatchRunner, ProgressReporter};
use talentpulse::broadcast::BatchProgressEvent;
use talentpulse::db::Database;
use talentpulse::evaluator::{Evaluation, Evaluator, EvaluatorError};
use talentpulse::extract::ExtractorRegistry;
use talentpulse::storage::{ResultStore, UploadStore};

/// Marker string that makes the scripted evaluator fail the job.
pub const FAIL_MARKER: &str = "FAIL_EVAL";

/// Marker string that makes the scripted evaluator sleep before answering.
pub const SLOW_MARKER: &str = "SLOW_EVAL";

/// Deterministic evaluator driven by marker strings in the document text.
///
/// Documents containing [`FAIL_MARKER`] fail with a scripted API error;
/// documents containing [`SLOW_MARKER`] succeed after a 300ms delay;
/// everything else succeeds immediately. The candidate name is the
/// document's first line.
pub struct ScriptedEvaluator;

impl Evaluator for ScriptedEvaluator {
    fn evaluate(
        &self,
        document_text: &str,
        _job_description: &str,
    ) -> Result<Evaluation, EvaluatorError> {
        if document_text.contains(FAIL_MARKER) {
            return Err(EvaluatorError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        if document_text.contains(SLOW_MARKER) {
            std::thread::sleep(Duration::from_millis(300));
        }

        let candidate_name = document_text
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("Unknown")
            .trim()
            .to_string();

        Ok(Evaluation {
            candidate_name,
            years_experience: 6,
            match_percentage: 90,
            feedback: "Scripted evaluation.".to_string(),
        })
    }
}

/// Progress reporter that records every event it receives.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<BatchProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in arrival order.
    pub fn events(&self) -> Vec<BatchProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: BatchProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Isolated environment for one test: directories, database, reporter.
pub struct TestHarness {
    temp_dir: TempDir,
    /// In-memory database with migrations applied.
    pub database: Database,
    /// Reporter shared with every runner built by this harness.
    pub reporter: Arc<RecordingReporter>,
}

impl TestHarness {
    pub fn new() -> Self {
        talentpulse::logging::init_logging();

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let database = Database::open_in_memory().expect("Failed to open in-memory database");

        Self {
            temp_dir,
            database,
            reporter: Arc::new(RecordingReporter::new()),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.temp_dir.path().join("uploads")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.temp_dir.path().join("results")
    }

    /// Fresh store handle over this harness's results directory.
    pub fn results(&self) -> ResultStore {
        ResultStore::new(self.results_dir())
    }

    /// Runner wired to the scripted evaluator.
    pub fn runner(&self, worker_count: usize) -> BatchRunner {
        self.runner_with_evaluator(worker_count, Arc::new(ScriptedEvaluator))
    }

    /// Runner wired to a caller-chosen evaluator.
    pub fn runner_with_evaluator(
        &self,
        worker_count: usize,
        evaluator: Arc<dyn Evaluator>,
    ) -> BatchRunner {
        BatchRunner::with_reporter(
            self.database.clone(),
            UploadStore::new(self.upload_dir()),
            self.results(),
            Arc::new(ExtractorRegistry::new()),
            evaluator,
            worker_count,
            Duration::from_secs(10),
            Arc::clone(&self.reporter) as Arc<dyn ProgressReporter>,
        )
    }

    /// Events recorded so far across every runner from this harness.
    pub fn events(&self) -> Vec<BatchProgressEvent> {
        self.reporter.events()
    }

    pub fn base_path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a plain-text document whose first line is the candidate name.
pub fn text_document(filename: &str, candidate: &str, body: &str) -> BatchDocument {
    BatchDocument::new(filename, format!("{candidate}\n{body}").into_bytes())
}
