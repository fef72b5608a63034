use std::sync::Arc;

use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{IndexName, RetentionMode};
use tracing::warn;

use crate::audit_index_ports::{
    AuditFailure, AuditFailureObserver, AuditOperation, AuditSearchIndex, AuditTaskQueue,
};
use crate::{AuditIndexConfig, AuditTask, DispatchMode, QueueRoute};

mod retention;
mod store;

pub use store::{IndexOutcome, StoreAuditOutcome};

/// Audit indexing and retention pipeline.
///
/// Hot-path operations never return errors: failures are logged, reported to
/// the optional failure observer and folded into the returned outcome.
#[derive(Clone)]
pub struct AuditIndexService {
    search_index: Arc<dyn AuditSearchIndex>,
    task_queue: Option<Arc<dyn AuditTaskQueue>>,
    failure_observer: Option<Arc<dyn AuditFailureObserver>>,
    index: IndexName,
    dispatch_mode: DispatchMode,
    retention_mode: RetentionMode,
}

impl AuditIndexService {
    /// Creates the pipeline for one configured index.
    #[must_use]
    pub fn new(search_index: Arc<dyn AuditSearchIndex>, config: &AuditIndexConfig) -> Self {
        Self {
            search_index,
            task_queue: None,
            failure_observer: None,
            index: config.index.clone(),
            dispatch_mode: DispatchMode::select(&config.queue),
            retention_mode: config.retention_mode,
        }
    }

    /// Adds the task queue used when deferred dispatch is enabled.
    #[must_use]
    pub fn with_task_queue(mut self, task_queue: Arc<dyn AuditTaskQueue>) -> Self {
        self.task_queue = Some(task_queue);
        self
    }

    /// Adds a hook notified about absorbed failures.
    #[must_use]
    pub fn with_failure_observer(
        mut self,
        failure_observer: Arc<dyn AuditFailureObserver>,
    ) -> Self {
        self.failure_observer = Some(failure_observer);
        self
    }

    /// Returns the selected dispatch mode.
    #[must_use]
    pub fn dispatch_mode(&self) -> &DispatchMode {
        &self.dispatch_mode
    }

    async fn enqueue(&self, task: AuditTask, route: &QueueRoute) -> AppResult<()> {
        let task_queue = self.task_queue.as_ref().ok_or_else(|| {
            AppError::Conflict("queued audit dispatch requires a task queue".to_owned())
        })?;

        task_queue.enqueue(task, route).await
    }

    fn report(
        &self,
        operation: AuditOperation,
        auditable_type: &str,
        auditable_id: &str,
        error: &AppError,
    ) {
        warn!(
            operation = operation.as_str(),
            index = %self.index,
            auditable_type = %auditable_type,
            auditable_id = %auditable_id,
            error = %error,
            "audit pipeline absorbed failure"
        );

        if let Some(observer) = &self.failure_observer {
            observer.observe(&AuditFailure {
                operation,
                auditable_type,
                auditable_id,
                error,
            });
        }
    }
}
