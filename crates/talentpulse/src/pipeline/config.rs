use std::time::Duration;

use crate::config::AppConfig;

pub struct PipelineConfig {
    /// Job description every document in the batch is scored against.
    pub job_description: String,
    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,
}

impl PipelineConfig {
    pub fn new(job_description: &str, oracle_timeout: Duration) -> Self {
        Self {
            job_description: job_description.to_string(),
            oracle_timeout,
        }
    }

    pub fn from_config(config: &AppConfig, job_description: &str) -> Self {
        Self::new(
            job_description,
            Duration::from_secs(config.evaluator.timeout_secs),
        )
    }
}
