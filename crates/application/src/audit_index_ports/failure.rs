use auditsearch_core::AppError;

/// Hot-path operation whose failure is absorbed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    /// Writing one audit document.
    IndexDocument,
    /// Enqueueing a deferred index task.
    EnqueueIndex,
    /// Querying retention candidates.
    SearchExcess,
    /// Bulk deleting retention candidates.
    BulkDelete,
    /// Enqueueing a deferred prune task.
    EnqueuePrune,
}

impl AuditOperation {
    /// Returns a stable label for logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexDocument => "index_document",
            Self::EnqueueIndex => "enqueue_index",
            Self::SearchExcess => "search_excess",
            Self::BulkDelete => "bulk_delete",
            Self::EnqueuePrune => "enqueue_prune",
        }
    }
}

/// Details of one absorbed failure.
#[derive(Debug)]
pub struct AuditFailure<'a> {
    /// Operation that failed.
    pub operation: AuditOperation,
    /// Entity kind the operation worked on.
    pub auditable_type: &'a str,
    /// Entity identifier the operation worked on.
    pub auditable_id: &'a str,
    /// Underlying error.
    pub error: &'a AppError,
}

/// Hook notified whenever the pipeline absorbs a failure instead of returning it.
pub trait AuditFailureObserver: Send + Sync {
    /// Observes one absorbed failure.
    fn observe(&self, failure: &AuditFailure<'_>);
}
