use async_trait::async_trait;
use auditsearch_application::{AuditTask, AuditTaskEnvelope, AuditTaskQueue, QueueRoute};
use auditsearch_core::{AppError, AppResult};
use tokio::sync::mpsc;

/// In-process task queue backed by a bounded channel.
///
/// The receiving half is driven by a worker task in the same process.
#[derive(Clone)]
pub struct ChannelAuditTaskQueue {
    sender: mpsc::Sender<AuditTaskEnvelope>,
}

impl ChannelAuditTaskQueue {
    /// Creates a queue holding at most `capacity` pending tasks, and its receiver.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<AuditTaskEnvelope>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl AuditTaskQueue for ChannelAuditTaskQueue {
    async fn enqueue(&self, task: AuditTask, route: &QueueRoute) -> AppResult<()> {
        self.sender
            .send(AuditTaskEnvelope::new(task, route.clone()))
            .await
            .map_err(|_| AppError::Unavailable("audit task channel is closed".to_owned()))
    }
}
