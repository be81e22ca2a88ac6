pub mod job;
pub mod pool;

pub use job::{EvalJob, JobOutcome};
pub use pool::WorkerPool;
