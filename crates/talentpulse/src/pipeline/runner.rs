use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info_span, warn};

use crate::db::{job_repo, Database};
use crate::evaluator::{evaluate_with_deadline, Evaluator};
use crate::extract::ExtractorRegistry;
use crate::sanitize;
use crate::storage::ResultStore;
use crate::worker::job::JobOutcome;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    database: Database,
    extractor: Arc<ExtractorRegistry>,
    results: ResultStore,
    evaluator: Arc<dyn Evaluator>,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        database: Database,
        results: ResultStore,
        extractor: Arc<ExtractorRegistry>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        Self {
            config,
            database,
            extractor,
            results,
            evaluator,
        }
    }

    /// Run the full pipeline for a single document.
    /// Returns a (JobOutcome, PipelineContext) pair. A step failure
    /// settles the job as ERROR rather than propagating. On either
    /// path the artifact is on disk before the row turns terminal.
    pub fn run(&self, mut ctx: PipelineContext) -> (JobOutcome, PipelineContext) {
        let filename = sanitize::redact_path(&ctx.job.source_path);
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            batch_id = %ctx.job.batch_id,
            filename = %filename,
        )
        .entered();

        // Step 1: Extract text
        {
            let _step = info_span!("extract_text").entered();
            if let Err(e) = self.step_extract(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        // Step 2: Evaluate against the job description
        {
            let _step = info_span!("evaluate").entered();
            if let Err(e) = self.step_evaluate(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        // Step 3: Write the success artifact
        {
            let _step = info_span!("write_artifact").entered();
            if let Err(e) = self.step_write_artifact(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        // Step 4: Transition the row
        let result_ref = ctx.result_ref.clone().expect("result_ref set in step 3");
        let mut outcome = JobOutcome::done(&ctx.job, result_ref.clone());
        {
            let _step = info_span!("mark_done").entered();
            let now = Utc::now().to_rfc3339();
            match job_repo::mark_done(
                &self.database,
                &ctx.job.id,
                &result_ref.to_string_lossy(),
                &now,
            ) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(job_id = %ctx.job.id, "job already terminal when marking done");
                    outcome.store_failure =
                        Some("job already terminal when marking done".to_string());
                }
                Err(e) => {
                    error!(job_id = %ctx.job.id, error = %e, "failed to record completion");
                    outcome.store_failure = Some(e.to_string());
                }
            }
        }

        (outcome, ctx)
    }

    fn step_extract(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let text = self.extractor.extract(&ctx.job.source_path)?;
        ctx.extracted_text = Some(text);
        Ok(())
    }

    fn step_evaluate(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let text = ctx.extracted_text.as_ref().expect("step 1 completed");
        let evaluation = evaluate_with_deadline(
            Arc::clone(&self.evaluator),
            text.clone(),
            self.config.job_description.clone(),
            self.config.oracle_timeout,
        )?;
        ctx.evaluation = Some(evaluation);
        Ok(())
    }

    fn step_write_artifact(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let evaluation = ctx.evaluation.as_ref().expect("step 2 completed");
        let payload = serde_json::to_value(evaluation)?;
        let path = self.results.write_success(&ctx.job.id, &payload)?;
        ctx.result_ref = Some(path);
        Ok(())
    }

    /// Settles a failed job: failure artifact first, then the row.
    /// Both writes are best effort — a store error here lands on the
    /// outcome's `store_failure` instead of masking the original error.
    fn fail(&self, ctx: PipelineContext, error: PipelineError) -> (JobOutcome, PipelineContext) {
        let message = error.to_string();
        let trace = format!("{error:?}");
        warn!(job_id = %ctx.job.id, error = %message, "job failed");

        let mut outcome = JobOutcome::failed(&ctx.job, message.clone());

        if let Err(e) = self.results.write_failure(&ctx.job.id, &message, &trace) {
            error!(job_id = %ctx.job.id, error = %e, "failed to write failure artifact");
            outcome.store_failure = Some(e.to_string());
        }

        let now = Utc::now().to_rfc3339();
        match job_repo::mark_error(&self.database, &ctx.job.id, &message, &now) {
            Ok(true) => {}
            Ok(false) => {
                warn!(job_id = %ctx.job.id, "job already terminal when marking error");
                if outcome.store_failure.is_none() {
                    outcome.store_failure =
                        Some("job already terminal when marking error".to_string());
                }
            }
            Err(e) => {
                error!(job_id = %ctx.job.id, error = %e, "failed to record failure");
                if outcome.store_failure.is_none() {
                    outcome.store_failure = Some(e.to_string());
                }
            }
        }

        (outcome, ctx)
    }
}
