//! Application services and ports of the audit index pipeline.

#![forbid(unsafe_code)]

mod audit_index_config;
mod audit_index_ports;
mod audit_index_service;
mod audit_tasks;
mod dispatch_mode;
mod index_schema_service;

pub use audit_index_config::{
    AuditIndexConfig, AuditQueueConfig, DEFAULT_INDEX_NAME, DEFAULT_QUEUE_CONNECTION,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_SEARCH_HOST,
};
pub use audit_index_ports::{
    AuditFailure, AuditFailureObserver, AuditIndexAdmin, AuditOperation, AuditSearchIndex,
    AuditTaskQueue, BulkDeleteSummary,
};
pub use audit_index_service::{AuditIndexService, IndexOutcome, StoreAuditOutcome};
pub use audit_tasks::{
    AuditTask, AuditTaskEnvelope, AuditTaskOutcome, AuditUnitOfWork, IndexAuditTask,
    PruneAuditsTask,
};
pub use dispatch_mode::{DispatchMode, QueueRoute};
pub use index_schema_service::{IndexSchemaService, IndexSetupReport};
