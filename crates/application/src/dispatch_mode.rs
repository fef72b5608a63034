use serde::{Deserialize, Serialize};

use crate::AuditQueueConfig;

/// Queue destination of one deferred task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRoute {
    /// Queue name on the connection. `None` targets the connection's default queue.
    pub queue: Option<String>,
    /// Task-queue connection name.
    pub connection: String,
}

/// Where index and prune work runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchMode {
    /// Execute in the caller's flow.
    Inline,
    /// Hand the work to the task queue on this route.
    Queued(QueueRoute),
}

impl DispatchMode {
    /// Selects the dispatch mode for the configured queue settings.
    #[must_use]
    pub fn select(config: &AuditQueueConfig) -> Self {
        if !config.enabled {
            return Self::Inline;
        }

        let connection = config
            .connection
            .as_deref()
            .map(str::trim)
            .filter(|connection| !connection.is_empty())
            .unwrap_or(config.default_connection.as_str())
            .to_owned();
        let queue = config
            .queue
            .as_deref()
            .map(str::trim)
            .filter(|queue| !queue.is_empty())
            .map(str::to_owned);

        Self::Queued(QueueRoute { queue, connection })
    }

    /// Returns whether work is deferred to the task queue.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}
