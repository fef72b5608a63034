//! Auditsearch deferred task worker.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use auditsearch_application::{
    AuditIndexConfig, AuditIndexService, AuditQueueConfig, AuditTaskEnvelope, AuditTaskOutcome,
    DispatchMode, QueueRoute,
};
use auditsearch_core::{AppError, AppResult};
use auditsearch_infrastructure::{
    DEFAULT_QUEUE_KEY_PREFIX, ElasticsearchAuditIndex, RedisAuditTaskQueue,
    TracingFailureObserver,
};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    redis_url: String,
    key_prefix: String,
    worker_id: String,
    pop_timeout_seconds: u32,
    retry_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let index_config = AuditIndexConfig::from_lookup(|name| env::var(name).ok())?;
    let route = worker_route(&index_config.queue)?;

    let search_index = Arc::new(ElasticsearchAuditIndex::from_config(&index_config)?);
    let service = AuditIndexService::new(search_index, &index_config)
        .with_failure_observer(Arc::new(TracingFailureObserver));

    let client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
    let queue = RedisAuditTaskQueue::new(client, config.key_prefix.as_str());

    info!(
        worker_id = %config.worker_id,
        index = %index_config.index,
        queue_key = %queue.key_for(&route),
        pop_timeout_seconds = config.pop_timeout_seconds,
        "auditsearch-worker started"
    );

    loop {
        match queue
            .pop(&route, f64::from(config.pop_timeout_seconds))
            .await
        {
            Ok(Some(envelope)) => run_task(&service, &config, envelope).await,
            Ok(None) => {}
            Err(AppError::Validation(error)) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "dropped malformed audit task message"
                );
            }
            Err(error) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "failed to pop audit task"
                );
                tokio::time::sleep(Duration::from_millis(config.retry_interval_ms)).await;
            }
        }
    }
}

async fn run_task(
    service: &AuditIndexService,
    config: &WorkerConfig,
    envelope: AuditTaskEnvelope,
) {
    let task_name = envelope.task.as_unit_of_work().name();
    let (auditable_type, auditable_id) = envelope.task.subject();
    let queued_for_ms = (Utc::now() - envelope.enqueued_at).num_milliseconds().max(0);

    match envelope.task.execute(service).await {
        AuditTaskOutcome::Indexed { document_id } => info!(
            worker_id = %config.worker_id,
            task = task_name,
            auditable_type = %auditable_type,
            auditable_id = %auditable_id,
            document_id = %document_id,
            queued_for_ms,
            "audit task executed"
        ),
        AuditTaskOutcome::Pruned { deleted } => info!(
            worker_id = %config.worker_id,
            task = task_name,
            auditable_type = %auditable_type,
            auditable_id = %auditable_id,
            deleted,
            queued_for_ms,
            "audit task executed"
        ),
        AuditTaskOutcome::Discarded => warn!(
            worker_id = %config.worker_id,
            task = task_name,
            auditable_type = %auditable_type,
            auditable_id = %auditable_id,
            queued_for_ms,
            "audit task discarded"
        ),
    }
}

/// Resolves the route producers push to, whether or not queueing is enabled
/// in this process.
fn worker_route(queue: &AuditQueueConfig) -> AppResult<QueueRoute> {
    let forced = AuditQueueConfig {
        enabled: true,
        ..queue.clone()
    };

    match DispatchMode::select(&forced) {
        DispatchMode::Queued(route) => Ok(route),
        DispatchMode::Inline => Err(AppError::Internal(
            "queue route could not be resolved".to_owned(),
        )),
    }
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let redis_url = env::var("REDIS_URL")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "redis://127.0.0.1:6379".to_owned());
        let key_prefix = env::var("AUDIT_QUEUE_KEY_PREFIX")
            .ok()
            .map(|value| value.trim().trim_end_matches(':').to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_QUEUE_KEY_PREFIX.to_owned());
        let worker_id = env::var("WORKER_ID")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("worker-{}", std::process::id()));
        let pop_timeout_seconds = parse_env_u32("AUDIT_WORKER_POP_TIMEOUT_SECONDS", 5)?;
        let retry_interval_ms = parse_env_u64("AUDIT_WORKER_RETRY_INTERVAL_MS", 1500)?;

        if pop_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "AUDIT_WORKER_POP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            redis_url,
            key_prefix,
            worker_id,
            pop_timeout_seconds,
            retry_interval_ms,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
