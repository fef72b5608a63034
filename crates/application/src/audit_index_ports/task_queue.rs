use async_trait::async_trait;
use auditsearch_core::AppResult;

use crate::{AuditTask, QueueRoute};

/// Port for handing audit work to a deferred task runner.
#[async_trait]
pub trait AuditTaskQueue: Send + Sync {
    /// Enqueues one task on the routed queue. Returns once the task is accepted,
    /// not once it has run.
    async fn enqueue(&self, task: AuditTask, route: &QueueRoute) -> AppResult<()>;
}
