//! Batch progress broadcaster for real-time evaluation status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::batch::status::JobStatus;

/// Progress event for one job within a batch.
///
/// Emitted once when the job is queued and once when it reaches a terminal
/// status. `completed_so_far` counts successful jobs only, mirroring the
/// batch's `completed_files` counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgressEvent {
    pub batch_id: String,
    pub job_id: String,
    /// Original filename as submitted.
    pub filename: String,
    pub status: JobStatus,
    pub completed_so_far: i64,
    pub total_files: i64,
    pub timestamp: DateTime<Utc>,
    /// Artifact reference (set on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ref: Option<String>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchProgressEvent {
    /// Creates a queued event for a freshly inserted job.
    pub fn queued(batch_id: &str, job_id: &str, filename: &str, total_files: i64) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            status: JobStatus::Pending,
            completed_so_far: 0,
            total_files,
            timestamp: Utc::now(),
            result_ref: None,
            error: None,
        }
    }

    /// Creates a success event.
    pub fn done(
        batch_id: &str,
        job_id: &str,
        filename: &str,
        result_ref: &str,
        completed_so_far: i64,
        total_files: i64,
    ) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            status: JobStatus::Done,
            completed_so_far,
            total_files,
            timestamp: Utc::now(),
            result_ref: Some(result_ref.to_string()),
            error: None,
        }
    }

    /// Creates a failure event.
    pub fn failed(
        batch_id: &str,
        job_id: &str,
        filename: &str,
        error: &str,
        completed_so_far: i64,
        total_files: i64,
    ) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            status: JobStatus::Error,
            completed_so_far,
            total_files,
            timestamp: Utc::now(),
            result_ref: None,
            error: Some(error.to_string()),
        }
    }
}

/// Broadcasts batch progress events to any number of subscribers.
#[derive(Clone)]
pub struct BatchProgressBroadcaster {
    sender: Arc<broadcast::Sender<BatchProgressEvent>>,
}

impl BatchProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: BatchProgressEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber for progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for BatchProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcaster_creation() {
        let broadcaster = BatchProgressBroadcaster::new(10);
        let _rx = broadcaster.subscribe();
    }

    #[test]
    fn test_broadcaster_send_receive() {
        let broadcaster = BatchProgressBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();

        broadcaster.send(BatchProgressEvent::queued("batch-1", "job-1", "resume.pdf", 3));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.batch_id, "batch-1");
        assert_eq!(received.job_id, "job-1");
        assert_eq!(received.filename, "resume.pdf");
        assert_eq!(received.status, JobStatus::Pending);
        assert_eq!(received.total_files, 3);
    }

    #[test]
    fn test_done_event_carries_result_ref() {
        let event =
            BatchProgressEvent::done("batch-1", "job-1", "resume.pdf", "/results/job-1.json", 2, 3);

        assert_eq!(event.status, JobStatus::Done);
        assert_eq!(event.completed_so_far, 2);
        assert_eq!(event.result_ref.as_deref(), Some("/results/job-1.json"));
        assert!(event.error.is_none());
    }

    #[test]
    fn test_failed_event_carries_error() {
        let event = BatchProgressEvent::failed(
            "batch-1",
            "job-2",
            "corrupt.pdf",
            "Failed to extract text from PDF: invalid header",
            1,
            3,
        );

        assert_eq!(event.status, JobStatus::Error);
        assert!(event.result_ref.is_none());
        assert_eq!(
            event.error.as_deref(),
            Some("Failed to extract text from PDF: invalid header")
        );
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = BatchProgressEvent::done("b", "j", "f.pdf", "ref", 1, 2);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["batchId"], "b");
        assert_eq!(json["completedSoFar"], 1);
        assert_eq!(json["totalFiles"], 2);
        assert_eq!(json["status"], "DONE");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_send_without_subscribers_does_not_panic() {
        let broadcaster = BatchProgressBroadcaster::new(10);
        broadcaster.send(BatchProgressEvent::queued("b", "j", "f.pdf", 1));
    }
}
