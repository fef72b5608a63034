//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod channel_audit_task_queue;
mod elasticsearch_audit_index;
mod in_memory_audit_index;
mod redis_audit_task_queue;
mod tracing_failure_observer;

pub use channel_audit_task_queue::ChannelAuditTaskQueue;
pub use elasticsearch_audit_index::ElasticsearchAuditIndex;
pub use in_memory_audit_index::InMemoryAuditIndex;
pub use redis_audit_task_queue::{DEFAULT_QUEUE_KEY_PREFIX, RedisAuditTaskQueue};
pub use tracing_failure_observer::TracingFailureObserver;
