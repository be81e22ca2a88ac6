use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Text extraction failed: {0}")]
    Extract(#[from] crate::error::ExtractError),

    #[error("Evaluation failed: {0}")]
    Evaluate(#[from] crate::evaluator::EvaluatorError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Result encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
