pub mod batch;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use batch::{BatchDocument, BatchReport, BatchRunner, BatchStatus, JobStatus};
pub use broadcast::{BatchProgressBroadcaster, BatchProgressEvent};
pub use config::{build_evaluator, load_config, AppConfig, EvaluatorConfig};
pub use error::{
    ConfigError, ExtractError, Result, StorageError, TalentPulseError, WorkerError,
};
pub use evaluator::{Evaluation, Evaluator, GeminiEvaluator, KeywordEvaluator};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext};
pub use storage::{ResultPreview, ResultStore, UploadStore};
