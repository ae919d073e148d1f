//! The optional progress sink: one event per processed URL, best-effort
//! ordering. Callers implement a trait; the engine never touches a
//! concrete channel type.

/// Outcome of processing one URL, attached to a [`ProgressEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Success,
    Error,
}

/// One event per processed URL.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub url: String,
    pub status: ProgressStatus,
    pub depth: u32,
    pub pages_processed: usize,
    pub queue_size: usize,
    pub issues_found: usize,
    pub documents_found: usize,
}

/// Implemented by callers that want progress updates; the engine never
/// initializes one itself.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}
