use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use auditsearch_application::{AuditIndexAdmin, AuditSearchIndex, BulkDeleteSummary};
use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{IndexDocument, IndexName, IndexSettings, MappedField, RetentionQuery};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StoredIndex {
    settings: Option<IndexSettings>,
    mapped_fields: usize,
    aliases: HashSet<String>,
    documents: HashMap<String, IndexDocument>,
}

/// In-memory audit index for local runs and tests.
///
/// Writes to an unknown index create it implicitly, the same way the search
/// engine does with dynamic index creation enabled.
#[derive(Debug, Default)]
pub struct InMemoryAuditIndex {
    indices: RwLock<HashMap<String, StoredIndex>>,
}

impl InMemoryAuditIndex {
    /// Creates an empty in-memory index store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents stored in the index.
    pub async fn document_count(&self, index: &IndexName) -> usize {
        self.indices
            .read()
            .await
            .get(index.as_str())
            .map_or(0, |stored| stored.documents.len())
    }

    /// Returns the aliases registered for the index.
    pub async fn aliases(&self, index: &IndexName) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .indices
            .read()
            .await
            .get(index.as_str())
            .map(|stored| stored.aliases.iter().cloned().collect())
            .unwrap_or_default();
        aliases.sort();
        aliases
    }
}

#[async_trait]
impl AuditSearchIndex for InMemoryAuditIndex {
    async fn index_document(&self, index: &IndexName, document: &IndexDocument) -> AppResult<()> {
        self.indices
            .write()
            .await
            .entry(index.as_str().to_owned())
            .or_default()
            .documents
            .insert(document.id().to_string(), document.clone());
        Ok(())
    }

    async fn search_excess_documents(
        &self,
        index: &IndexName,
        query: &RetentionQuery,
    ) -> AppResult<Vec<String>> {
        let indices = self.indices.read().await;
        let Some(stored) = indices.get(index.as_str()) else {
            return Err(AppError::NotFound(format!("index '{index}' does not exist")));
        };

        let mut matching: Vec<&IndexDocument> = stored
            .documents
            .values()
            .filter(|document| {
                document.record().auditable_id == query.auditable_id()
                    && document.record().auditable_type == query.auditable_type()
            })
            .collect();
        matching.sort_by(|left, right| right.record().created_at.cmp(&left.record().created_at));

        let skip = usize::try_from(query.skip()).unwrap_or(usize::MAX);
        let size = usize::try_from(query.size()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(size)
            .map(|document| document.id().to_string())
            .collect())
    }

    async fn bulk_delete(
        &self,
        index: &IndexName,
        document_ids: &[String],
    ) -> AppResult<BulkDeleteSummary> {
        let mut indices = self.indices.write().await;
        let Some(stored) = indices.get_mut(index.as_str()) else {
            return Err(AppError::NotFound(format!("index '{index}' does not exist")));
        };

        for document_id in document_ids {
            stored.documents.remove(document_id);
        }

        Ok(BulkDeleteSummary {
            requested: document_ids.len(),
            failed: 0,
        })
    }
}

#[async_trait]
impl AuditIndexAdmin for InMemoryAuditIndex {
    async fn index_exists(&self, index: &IndexName) -> AppResult<bool> {
        Ok(self.indices.read().await.contains_key(index.as_str()))
    }

    async fn create_index(&self, index: &IndexName, settings: IndexSettings) -> AppResult<()> {
        let mut indices = self.indices.write().await;
        if indices.contains_key(index.as_str()) {
            return Err(AppError::Conflict(format!("index '{index}' already exists")));
        }

        indices.insert(
            index.as_str().to_owned(),
            StoredIndex {
                settings: Some(settings),
                ..StoredIndex::default()
            },
        );
        Ok(())
    }

    async fn put_mapping(&self, index: &IndexName, fields: &[MappedField]) -> AppResult<()> {
        let mut indices = self.indices.write().await;
        let stored = indices
            .get_mut(index.as_str())
            .ok_or_else(|| AppError::NotFound(format!("index '{index}' does not exist")))?;
        stored.mapped_fields = fields.len();
        Ok(())
    }

    async fn add_alias(&self, index: &IndexName, alias: &str) -> AppResult<()> {
        let mut indices = self.indices.write().await;
        let stored = indices
            .get_mut(index.as_str())
            .ok_or_else(|| AppError::NotFound(format!("index '{index}' does not exist")))?;
        stored.aliases.insert(alias.to_owned());
        Ok(())
    }

    async fn delete_index(&self, index: &IndexName) -> AppResult<()> {
        self.indices
            .write()
            .await
            .remove(index.as_str())
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("index '{index}' does not exist")))
    }
}
