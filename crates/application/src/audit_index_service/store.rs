use auditsearch_domain::{AuditRecord, IndexDocument};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::AuditIndexService;
use crate::audit_index_ports::AuditOperation;
use crate::{AuditTask, DispatchMode, IndexAuditTask};

/// Result of writing one audit document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The document was accepted by the index.
    Indexed {
        /// Generated document identifier.
        document_id: Uuid,
    },
    /// The write failed and the record was dropped.
    Discarded,
}

/// Result of submitting one audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAuditOutcome {
    /// The document was written inline.
    Indexed {
        /// Generated document identifier.
        document_id: Uuid,
    },
    /// An index task was accepted by the task queue.
    Queued,
    /// The record was dropped after a write or enqueue failure.
    Discarded,
}

impl From<IndexOutcome> for StoreAuditOutcome {
    fn from(value: IndexOutcome) -> Self {
        match value {
            IndexOutcome::Indexed { document_id } => Self::Indexed { document_id },
            IndexOutcome::Discarded => Self::Discarded,
        }
    }
}

impl AuditIndexService {
    /// Stamps the record with the current time and indexes it inline or
    /// through the task queue, depending on the dispatch mode.
    pub async fn store_audit(&self, record: AuditRecord) -> StoreAuditOutcome {
        let record = record.stamped(Utc::now());

        match &self.dispatch_mode {
            DispatchMode::Inline => self.index_document(record).await.into(),
            DispatchMode::Queued(route) => {
                let auditable_type = record.auditable_type.clone();
                let auditable_id = record.auditable_id.clone();
                let task = AuditTask::IndexAudit(IndexAuditTask { record });

                match self.enqueue(task, route).await {
                    Ok(()) => {
                        debug!(
                            auditable_type = %auditable_type,
                            auditable_id = %auditable_id,
                            connection = %route.connection,
                            queue = route.queue.as_deref().unwrap_or("default"),
                            "queued audit index task"
                        );
                        StoreAuditOutcome::Queued
                    }
                    Err(error) => {
                        self.report(
                            AuditOperation::EnqueueIndex,
                            auditable_type.as_str(),
                            auditable_id.as_str(),
                            &error,
                        );
                        StoreAuditOutcome::Discarded
                    }
                }
            }
        }
    }

    /// Writes one record under a fresh random identifier.
    ///
    /// Failures are absorbed: the outcome is `Discarded` and no document exists.
    pub async fn index_document(&self, record: AuditRecord) -> IndexOutcome {
        let document = IndexDocument::new(record);

        match self
            .search_index
            .index_document(&self.index, &document)
            .await
        {
            Ok(()) => {
                debug!(
                    index = %self.index,
                    document_id = %document.id(),
                    auditable_type = %document.record().auditable_type,
                    auditable_id = %document.record().auditable_id,
                    "indexed audit document"
                );
                IndexOutcome::Indexed {
                    document_id: document.id(),
                }
            }
            Err(error) => {
                self.report(
                    AuditOperation::IndexDocument,
                    document.record().auditable_type.as_str(),
                    document.record().auditable_id.as_str(),
                    &error,
                );
                IndexOutcome::Discarded
            }
        }
    }
}
