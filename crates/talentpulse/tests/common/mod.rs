//! Shared test utilities for talentpulse integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated batch runs with temp directories
//! - A scripted evaluator driven by marker strings in the document text
//! - A recording progress reporter for asserting on emitted events

pub mod harness;

pub use harness::{
    text_document, RecordingReporter, ScriptedEvaluator, TestHarness, FAIL_MARKER, SLOW_MARKER,
};
