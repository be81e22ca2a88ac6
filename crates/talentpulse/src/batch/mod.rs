pub mod progress;
pub mod status;
pub mod submit;

pub use progress::{BroadcastReporter, NoopProgress, ProgressReporter};
pub use status::{BatchStatus, JobStatus};
pub use submit::{BatchDocument, BatchReport, BatchRunner};
