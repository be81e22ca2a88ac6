//! Resume evaluation oracles.
//!
//! An [`Evaluator`] turns one document's text plus a job description into a
//! structured [`Evaluation`]. The pipeline treats evaluators as black boxes
//! behind the trait; [`evaluate_with_deadline`] bounds any of them with a
//! hard timeout.

pub mod gemini;
pub mod keyword;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::{GeminiEvaluator, DEFAULT_MODEL};
pub use keyword::KeywordEvaluator;

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse model response: {0}")]
    ResponseParse(String),

    #[error("Model response contained no candidates")]
    EmptyResponse,

    #[error("Evaluation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Failed to start evaluation thread: {0}")]
    Thread(String),
}

/// Structured outcome of evaluating one resume against a job description.
///
/// Serialized as-is into the success artifact, so the field names are the
/// artifact's wire keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub candidate_name: String,
    #[serde(default)]
    pub years_experience: i64,
    #[serde(default)]
    pub match_percentage: i64,
    pub feedback: String,
}

pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        document_text: &str,
        job_description: &str,
    ) -> Result<Evaluation, EvaluatorError>;
}

impl std::fmt::Debug for dyn Evaluator + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Evaluator")
    }
}

/// Runs `evaluator.evaluate` on a helper thread, converting an overrun of
/// `deadline` into [`EvaluatorError::Timeout`].
///
/// On timeout the in-flight call is abandoned in its thread and its late
/// result discarded; the calling worker slot is freed immediately.
pub fn evaluate_with_deadline(
    evaluator: Arc<dyn Evaluator>,
    document_text: String,
    job_description: String,
    deadline: Duration,
) -> Result<Evaluation, EvaluatorError> {
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);

    thread::Builder::new()
        .name("talentpulse-eval".into())
        .spawn(move || {
            let result = evaluator.evaluate(&document_text, &job_description);
            let _ = done_tx.send(result);
        })
        .map_err(|e| EvaluatorError::Thread(e.to_string()))?;

    match done_rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(_) => Err(EvaluatorError::Timeout {
            seconds: deadline.as_secs(),
        }),
    }
}
