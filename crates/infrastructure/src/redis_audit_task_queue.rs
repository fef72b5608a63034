//! Redis list-backed audit task queue.

use async_trait::async_trait;
use auditsearch_application::{AuditTask, AuditTaskEnvelope, AuditTaskQueue, QueueRoute};
use auditsearch_core::{AppError, AppResult};
use redis::AsyncCommands;

/// Key prefix shared by producers and the worker.
pub const DEFAULT_QUEUE_KEY_PREFIX: &str = "auditsearch:queues";

/// Redis implementation of the audit task queue port.
///
/// Each route maps to one list; producers push on the left and workers pop
/// from the right.
#[derive(Clone)]
pub struct RedisAuditTaskQueue {
    client: redis::Client,
    key_prefix: String,
}

impl RedisAuditTaskQueue {
    /// Creates a queue adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    /// Returns the list key a route is stored under.
    #[must_use]
    pub fn key_for(&self, route: &QueueRoute) -> String {
        format!(
            "{}:{}:{}",
            self.key_prefix,
            route.connection,
            route.queue.as_deref().unwrap_or("default")
        )
    }

    /// Blocks up to `timeout_seconds` for the next envelope on the route.
    pub async fn pop(
        &self,
        route: &QueueRoute,
        timeout_seconds: f64,
    ) -> AppResult<Option<AuditTaskEnvelope>> {
        let key = self.key_for(route);
        let mut connection = self.connection().await?;

        let popped: Option<(String, String)> = connection
            .brpop(key, timeout_seconds)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to pop audit task from redis: {error}"))
            })?;

        popped
            .map(|(_, message)| AuditTaskEnvelope::from_json(message.as_str()))
            .transpose()
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl AuditTaskQueue for RedisAuditTaskQueue {
    async fn enqueue(&self, task: AuditTask, route: &QueueRoute) -> AppResult<()> {
        let key = self.key_for(route);
        let message = AuditTaskEnvelope::new(task, route.clone()).to_json()?;
        let mut connection = self.connection().await?;

        connection
            .lpush(key, message)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to push audit task to redis: {error}"))
            })
    }
}
