use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{AuditableRef, RetentionQuery};
use tracing::{debug, info};

use super::AuditIndexService;
use crate::audit_index_ports::AuditOperation;
use crate::{AuditTask, DispatchMode, PruneAuditsTask};

impl AuditIndexService {
    /// Enforces the entity's audit threshold.
    ///
    /// Returns `false` without touching the index when the threshold is zero
    /// or negative. Inline, returns whether excess documents were deleted;
    /// queued, returns whether the prune task was accepted.
    pub async fn enforce(&self, entity: &AuditableRef) -> bool {
        if !entity.has_retention_limit() {
            return false;
        }

        match &self.dispatch_mode {
            DispatchMode::Inline => self.prune_entity(entity).await,
            DispatchMode::Queued(route) => {
                let task = AuditTask::PruneAudits(PruneAuditsTask {
                    entity: entity.clone(),
                });

                match self.enqueue(task, route).await {
                    Ok(()) => {
                        debug!(
                            auditable_type = %entity.auditable_type(),
                            auditable_id = %entity.auditable_id(),
                            connection = %route.connection,
                            queue = route.queue.as_deref().unwrap_or("default"),
                            "queued audit prune task"
                        );
                        true
                    }
                    Err(error) => {
                        self.report(
                            AuditOperation::EnqueuePrune,
                            entity.auditable_type(),
                            entity.auditable_id(),
                            &error,
                        );
                        false
                    }
                }
            }
        }
    }

    /// Runs one retention pass for the entity in the caller's flow.
    pub async fn prune_entity(&self, entity: &AuditableRef) -> bool {
        let Some(query) = RetentionQuery::for_entity(entity, self.retention_mode) else {
            return false;
        };

        // A skip past the result window leaves nothing the engine will page to.
        if query.size() == 0 {
            return false;
        }

        let document_ids = match self.find_excess_documents(&query).await {
            Ok(document_ids) => document_ids,
            Err(error) => {
                self.report(
                    AuditOperation::SearchExcess,
                    query.auditable_type(),
                    query.auditable_id(),
                    &error,
                );
                return false;
            }
        };

        self.bulk_delete(&document_ids, query.auditable_type(), query.auditable_id())
            .await
    }

    /// Returns identifiers of the entity's documents beyond the retained window,
    /// newest first.
    pub async fn find_excess_documents(&self, query: &RetentionQuery) -> AppResult<Vec<String>> {
        let mut document_ids = self
            .search_index
            .search_excess_documents(&self.index, query)
            .await?;

        let limit = usize::try_from(query.size()).unwrap_or(usize::MAX);
        document_ids.truncate(limit);
        Ok(document_ids)
    }

    /// Deletes documents in one bulk call.
    ///
    /// Returns `false` for an empty list or a failed call. Per-document
    /// failures inside a completed bulk call do not change the result.
    pub async fn delete_documents(&self, document_ids: &[String]) -> bool {
        self.bulk_delete(document_ids, "*", "*").await
    }

    async fn bulk_delete(
        &self,
        document_ids: &[String],
        auditable_type: &str,
        auditable_id: &str,
    ) -> bool {
        if document_ids.is_empty() {
            return false;
        }

        match self.search_index.bulk_delete(&self.index, document_ids).await {
            Ok(summary) => {
                if summary.failed > 0 {
                    let error = AppError::Internal(format!(
                        "{} of {} bulk delete operations failed",
                        summary.failed, summary.requested
                    ));
                    self.report(
                        AuditOperation::BulkDelete,
                        auditable_type,
                        auditable_id,
                        &error,
                    );
                }

                info!(
                    index = %self.index,
                    auditable_type = %auditable_type,
                    auditable_id = %auditable_id,
                    requested = summary.requested,
                    failed = summary.failed,
                    "pruned excess audit documents"
                );
                true
            }
            Err(error) => {
                self.report(
                    AuditOperation::BulkDelete,
                    auditable_type,
                    auditable_id,
                    &error,
                );
                false
            }
        }
    }
}
