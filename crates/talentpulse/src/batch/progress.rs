use crate::broadcast::batch_progress::{BatchProgressBroadcaster, BatchProgressEvent};

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: BatchProgressEvent);
}

/// No-op reporter for unit tests and headless runs.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: BatchProgressEvent) {}
}

/// Forwards events to a broadcast channel for live subscribers.
pub struct BroadcastReporter {
    broadcaster: BatchProgressBroadcaster,
}

impl BroadcastReporter {
    pub fn new(broadcaster: BatchProgressBroadcaster) -> Self {
        Self { broadcaster }
    }
}

impl ProgressReporter for BroadcastReporter {
    fn report(&self, event: BatchProgressEvent) {
        self.broadcaster.send(event);
    }
}
