use std::sync::Arc;

use auditsearch_core::AppResult;
use auditsearch_domain::{AUDIT_FIELD_MAPPING, IndexName, IndexSettings};
use tracing::info;

use crate::audit_index_ports::AuditIndexAdmin;

/// Summary of one `setup_index` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSetupReport {
    /// Whether the index was created by this run.
    pub created: bool,
}

/// Operator-facing lifecycle management of the audit index.
///
/// Unlike the write path, every failure here is returned to the caller.
#[derive(Clone)]
pub struct IndexSchemaService {
    admin: Arc<dyn AuditIndexAdmin>,
    index: IndexName,
}

impl IndexSchemaService {
    /// Creates a schema service for one index.
    #[must_use]
    pub fn new(admin: Arc<dyn AuditIndexAdmin>, index: IndexName) -> Self {
        Self { admin, index }
    }

    /// Returns the managed index name.
    #[must_use]
    pub fn index(&self) -> &IndexName {
        &self.index
    }

    /// Returns whether the index exists.
    pub async fn exists_index(&self) -> AppResult<bool> {
        self.admin.index_exists(&self.index).await
    }

    /// Creates the index with the fixed audit shard layout.
    pub async fn create_index(&self) -> AppResult<()> {
        self.admin
            .create_index(&self.index, IndexSettings::AUDIT)
            .await?;
        info!(
            index = %self.index,
            shards = IndexSettings::AUDIT.number_of_shards,
            replicas = IndexSettings::AUDIT.number_of_replicas,
            "created audit index"
        );
        Ok(())
    }

    /// Applies the fixed audit field mapping.
    pub async fn put_mapping(&self) -> AppResult<()> {
        self.admin
            .put_mapping(&self.index, AUDIT_FIELD_MAPPING)
            .await?;
        info!(index = %self.index, fields = AUDIT_FIELD_MAPPING.len(), "applied audit index mapping");
        Ok(())
    }

    /// Points the write alias at the index.
    pub async fn update_aliases(&self) -> AppResult<()> {
        let alias = self.index.write_alias();
        self.admin.add_alias(&self.index, alias.as_str()).await?;
        info!(index = %self.index, alias = %alias, "updated audit index aliases");
        Ok(())
    }

    /// Deletes the index and all audit documents in it.
    pub async fn delete_index(&self) -> AppResult<()> {
        self.admin.delete_index(&self.index).await?;
        info!(index = %self.index, "deleted audit index");
        Ok(())
    }

    /// Creates the index when absent, then applies the mapping and write alias.
    pub async fn setup_index(&self) -> AppResult<IndexSetupReport> {
        let created = if self.exists_index().await? {
            false
        } else {
            self.create_index().await?;
            true
        };

        self.put_mapping().await?;
        self.update_aliases().await?;

        Ok(IndexSetupReport { created })
    }
}
