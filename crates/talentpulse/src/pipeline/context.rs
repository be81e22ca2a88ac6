use std::path::PathBuf;

use crate::evaluator::Evaluation;
use crate::worker::job::EvalJob;

pub struct PipelineContext {
    // Input
    pub job: EvalJob,

    // Step 1 result — guaranteed Some after step_extract
    pub extracted_text: Option<String>,

    // Step 2 result — guaranteed Some after step_evaluate
    pub evaluation: Option<Evaluation>,

    // Step 3 result — path of the written success artifact
    pub result_ref: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(job: EvalJob) -> Self {
        Self {
            job,
            extracted_text: None,
            evaluation: None,
            result_ref: None,
        }
    }
}
