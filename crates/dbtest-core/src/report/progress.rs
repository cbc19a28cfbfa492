//! Progress events emitted by the runner while a suite executes. The console
//! layer consumes them through a sink; embedders can install their own.

use crate::model::{Operation, TestResult};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { engine: &'static str },
    Connected,
    TableReady { table: String },
    ProbeFinished(TestResult),
    ProbeSkipped { operation: Operation, reason: String },
    /// The run aborted before all probes finished.
    Aborted { error: String },
    CleanupWarning { error: String },
    /// Final banner of a run that was not aborted.
    Finished { overall: bool, duration_ms: u64 },
}

/// Sink for progress events. The runner calls it synchronously, in order.
pub type ProgressSink = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;
