//! Progress reporting for tool runs.

/// Observer for tool progress. Implementations must not fail; return values are never consulted.
pub trait ProgressSink: Send + Sync {
    /// A human-readable status line.
    fn notify(&self, message: &str);

    /// A remote URL whose content was used, for citation.
    fn add_source(&self, _url: &str) {}
}

/// No-op progress sink for headless/test usage.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn notify(&self, _message: &str) {}
}
