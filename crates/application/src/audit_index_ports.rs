mod failure;
mod index_admin;
mod search_index;
mod task_queue;

pub use failure::{AuditFailure, AuditFailureObserver, AuditOperation};
pub use index_admin::AuditIndexAdmin;
pub use search_index::{AuditSearchIndex, BulkDeleteSummary};
pub use task_queue::AuditTaskQueue;
