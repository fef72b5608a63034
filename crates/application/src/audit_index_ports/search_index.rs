use async_trait::async_trait;
use auditsearch_core::AppResult;
use auditsearch_domain::{IndexDocument, IndexName, RetentionQuery};

/// Engine-reported result of one bulk delete call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkDeleteSummary {
    /// Number of delete operations submitted.
    pub requested: usize,
    /// Number of operations the engine reported as failed.
    pub failed: usize,
}

/// Port for document writes and retention reads against the audit index.
#[async_trait]
pub trait AuditSearchIndex: Send + Sync {
    /// Stores one document under its identifier.
    async fn index_document(&self, index: &IndexName, document: &IndexDocument) -> AppResult<()>;

    /// Returns identifiers of documents matching the entity filter, newest
    /// first, starting at `query.skip()` and bounded by `query.size()`.
    async fn search_excess_documents(
        &self,
        index: &IndexName,
        query: &RetentionQuery,
    ) -> AppResult<Vec<String>>;

    /// Deletes documents by identifier in one bulk call.
    async fn bulk_delete(
        &self,
        index: &IndexName,
        document_ids: &[String],
    ) -> AppResult<BulkDeleteSummary>;
}
