use auditsearch_application::{AuditFailure, AuditFailureObserver};
use tracing::error;

/// Failure observer that records every absorbed pipeline failure as an error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureObserver;

impl AuditFailureObserver for TracingFailureObserver {
    fn observe(&self, failure: &AuditFailure<'_>) {
        error!(
            operation = failure.operation.as_str(),
            auditable_type = %failure.auditable_type,
            auditable_id = %failure.auditable_id,
            error = %failure.error,
            "audit pipeline failure absorbed"
        );
    }
}
