//! Broadcasting modules for real-time event streaming.
//!
//! Progress events fan out over a tokio broadcast channel so any embedding
//! surface (desktop shell, web layer, tests) can subscribe without the
//! pipeline knowing about it.

pub mod batch_progress;

pub use batch_progress::{BatchProgressBroadcaster, BatchProgressEvent};
