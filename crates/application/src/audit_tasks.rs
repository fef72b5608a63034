use async_trait::async_trait;
use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{AuditRecord, AuditableRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuditIndexService, IndexOutcome, QueueRoute};

/// Result of executing one deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTaskOutcome {
    /// The audit document was written.
    Indexed {
        /// Generated document identifier.
        document_id: Uuid,
    },
    /// The audit document could not be written.
    Discarded,
    /// Retention ran; `deleted` reports whether a bulk delete completed.
    Pruned {
        /// Whether excess documents were deleted.
        deleted: bool,
    },
}

/// Unit of deferred work that replays one inline pipeline call.
#[async_trait]
pub trait AuditUnitOfWork: Send + Sync {
    /// Stable task name for logs.
    fn name(&self) -> &'static str;

    /// Runs the inline code path this task stands for.
    async fn execute(&self, service: &AuditIndexService) -> AuditTaskOutcome;
}

/// Deferred write of one stamped audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexAuditTask {
    /// Record to index, already stamped.
    pub record: AuditRecord,
}

#[async_trait]
impl AuditUnitOfWork for IndexAuditTask {
    fn name(&self) -> &'static str {
        "index_audit"
    }

    async fn execute(&self, service: &AuditIndexService) -> AuditTaskOutcome {
        match service.index_document(self.record.clone()).await {
            IndexOutcome::Indexed { document_id } => AuditTaskOutcome::Indexed { document_id },
            IndexOutcome::Discarded => AuditTaskOutcome::Discarded,
        }
    }
}

/// Deferred retention pass for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneAuditsTask {
    /// Entity whose excess audits are deleted.
    pub entity: AuditableRef,
}

#[async_trait]
impl AuditUnitOfWork for PruneAuditsTask {
    fn name(&self) -> &'static str {
        "prune_audits"
    }

    async fn execute(&self, service: &AuditIndexService) -> AuditTaskOutcome {
        AuditTaskOutcome::Pruned {
            deleted: service.prune_entity(&self.entity).await,
        }
    }
}

/// Serializable task payload carried by a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditTask {
    /// Index one audit record.
    IndexAudit(IndexAuditTask),
    /// Prune excess audits of one entity.
    PruneAudits(PruneAuditsTask),
}

impl AuditTask {
    /// Returns the task as its executable unit of work.
    #[must_use]
    pub fn as_unit_of_work(&self) -> &dyn AuditUnitOfWork {
        match self {
            Self::IndexAudit(task) => task,
            Self::PruneAudits(task) => task,
        }
    }

    /// Returns the entity kind and identifier the task works on.
    #[must_use]
    pub fn subject(&self) -> (&str, &str) {
        match self {
            Self::IndexAudit(task) => (
                task.record.auditable_type.as_str(),
                task.record.auditable_id.as_str(),
            ),
            Self::PruneAudits(task) => (task.entity.auditable_type(), task.entity.auditable_id()),
        }
    }

    /// Executes the task through the inline pipeline.
    pub async fn execute(&self, service: &AuditIndexService) -> AuditTaskOutcome {
        self.as_unit_of_work().execute(service).await
    }
}

/// Queue message: one task plus the route it was enqueued on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTaskEnvelope {
    /// Task payload.
    pub task: AuditTask,
    /// Route resolved at enqueue time.
    pub route: QueueRoute,
    /// Enqueue timestamp.
    pub enqueued_at: DateTime<Utc>,
}

impl AuditTaskEnvelope {
    /// Wraps a task for the given route.
    #[must_use]
    pub fn new(task: AuditTask, route: QueueRoute) -> Self {
        Self {
            task,
            route,
            enqueued_at: Utc::now(),
        }
    }

    /// Encodes the envelope as a JSON message.
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self).map_err(|error| {
            AppError::Internal(format!("failed to serialize audit task envelope: {error}"))
        })
    }

    /// Decodes an envelope from a JSON message.
    pub fn from_json(message: &str) -> AppResult<Self> {
        serde_json::from_str(message).map_err(|error| {
            AppError::Validation(format!("invalid audit task envelope: {error}"))
        })
    }
}
