use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing upload and query activity.
#[derive(Default)]
pub struct ClientMetrics {
    tokens_issued: AtomicU64,
    uploads_succeeded: AtomicU64,
    uploads_failed: AtomicU64,
    queries_succeeded: AtomicU64,
    queries_failed: AtomicU64,
}

impl ClientMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a token obtained from the authorization server.
    pub fn record_token(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a single file upload.
    pub fn record_upload(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.uploads_succeeded
        } else {
            &self.uploads_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a query.
    pub fn record_query(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.queries_succeeded
        } else {
            &self.queries_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            queries_succeeded: self.queries_succeeded.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of client counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Tokens fetched since startup (cache hits excluded).
    pub tokens_issued: u64,
    /// Files accepted by the indexing service.
    pub uploads_succeeded: u64,
    /// Files that failed to upload.
    pub uploads_failed: u64,
    /// Queries answered with a summary.
    pub queries_succeeded: u64,
    /// Queries that failed for any reason.
    pub queries_failed: u64,
}
