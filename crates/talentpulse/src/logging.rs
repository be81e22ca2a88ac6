//! Structured logging initialization.
//!
//! The crate logs through a mix of `log::` and `tracing::` macros; the
//! `tracing-log` bridge routes both into a single `tracing-subscriber`
//! stack so span context from the pipeline shows up alongside plain
//! log lines.

use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber.
///
/// Filter is taken from `RUST_LOG`, defaulting to `info`. Safe to call
/// more than once — subsequent calls (and calls made after another
/// subscriber was installed, e.g. by a test harness) are no-ops.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Route log:: macro calls through tracing. Errors only mean a
        // logger is already set, which is fine.
        let _ = tracing_log::LogTracer::init();

        let subscriber = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(filter);

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
