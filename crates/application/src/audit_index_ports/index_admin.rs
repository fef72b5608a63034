use async_trait::async_trait;
use auditsearch_core::AppResult;
use auditsearch_domain::{IndexName, IndexSettings, MappedField};

/// Port for audit index lifecycle management.
#[async_trait]
pub trait AuditIndexAdmin: Send + Sync {
    /// Returns whether the index exists.
    async fn index_exists(&self, index: &IndexName) -> AppResult<bool>;

    /// Creates the index with the given shard layout.
    async fn create_index(&self, index: &IndexName, settings: IndexSettings) -> AppResult<()>;

    /// Applies explicit field mappings to the index.
    async fn put_mapping(&self, index: &IndexName, fields: &[MappedField]) -> AppResult<()>;

    /// Points an alias at the index.
    async fn add_alias(&self, index: &IndexName, alias: &str) -> AppResult<()>;

    /// Deletes the index and every document in it.
    async fn delete_index(&self, index: &IndexName) -> AppResult<()>;
}
