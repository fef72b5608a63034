use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{IndexName, RetentionMode};

/// Search-engine host used when none is configured.
pub const DEFAULT_SEARCH_HOST: &str = "localhost:9200";
/// Index name used when none is configured.
pub const DEFAULT_INDEX_NAME: &str = "laravel_auditing";
/// Task-queue connection used when neither the audit nor the system setting is present.
pub const DEFAULT_QUEUE_CONNECTION: &str = "default";
/// Request timeout applied to search-engine calls when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 15;

/// Deferred execution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQueueConfig {
    /// Whether index and prune work is handed to the task queue.
    pub enabled: bool,
    /// Queue name on the connection. `None` routes to the connection's default queue.
    pub queue: Option<String>,
    /// Connection dedicated to audit tasks.
    pub connection: Option<String>,
    /// System-wide default task-queue connection.
    pub default_connection: String,
}

impl Default for AuditQueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queue: None,
            connection: None,
            default_connection: DEFAULT_QUEUE_CONNECTION.to_owned(),
        }
    }
}

/// Pipeline configuration, resolved once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditIndexConfig {
    /// Search-engine hosts, tried in order.
    pub hosts: Vec<String>,
    /// Audit index name.
    pub index: IndexName,
    /// Timeout for one search-engine request.
    pub request_timeout_seconds: u64,
    /// Deferred execution settings.
    pub queue: AuditQueueConfig,
    /// Retention window accounting.
    pub retention_mode: RetentionMode,
}

impl AuditIndexConfig {
    /// Resolves configuration from a key lookup such as the process environment.
    ///
    /// Absent or blank keys fall back to defaults; malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let hosts = value("AUDIT_SEARCH_HOSTS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|host| !host.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .filter(|hosts| !hosts.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SEARCH_HOST.to_owned()]);

        let index = IndexName::new(
            value("AUDIT_SEARCH_INDEX").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_owned()),
        )
        .map_err(|error| AppError::Validation(format!("invalid AUDIT_SEARCH_INDEX: {error}")))?;

        let request_timeout_seconds = match value("AUDIT_SEARCH_TIMEOUT_SECONDS") {
            Some(raw) => raw.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid AUDIT_SEARCH_TIMEOUT_SECONDS value '{raw}': {error}"
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };

        if request_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "AUDIT_SEARCH_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let queue = AuditQueueConfig {
            enabled: parse_flag("AUDIT_QUEUE_ENABLED", value("AUDIT_QUEUE_ENABLED"))?,
            queue: value("AUDIT_QUEUE_NAME"),
            connection: value("AUDIT_QUEUE_CONNECTION"),
            default_connection: value("QUEUE_CONNECTION")
                .unwrap_or_else(|| DEFAULT_QUEUE_CONNECTION.to_owned()),
        };

        let retention_mode = if parse_flag(
            "AUDIT_RETENTION_RESERVE_INCOMING",
            value("AUDIT_RETENTION_RESERVE_INCOMING"),
        )? {
            RetentionMode::ReserveIncoming
        } else {
            RetentionMode::RetainThreshold
        };

        Ok(Self {
            hosts,
            index,
            request_timeout_seconds,
            queue,
            retention_mode,
        })
    }
}

fn parse_flag(name: &str, value: Option<String>) -> AppResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected true or false"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use auditsearch_domain::RetentionMode;

    use super::{AuditIndexConfig, DEFAULT_QUEUE_CONNECTION};

    fn config_from(pairs: &[(&str, &str)]) -> Result<AuditIndexConfig, String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        AuditIndexConfig::from_lookup(|name| values.get(name).cloned())
            .map_err(|error| error.to_string())
    }

    #[test]
    fn empty_lookup_resolves_defaults() {
        let config = config_from(&[]).unwrap_or_else(|_| unreachable!());
        assert_eq!(config.hosts, vec!["localhost:9200".to_owned()]);
        assert_eq!(config.index.as_str(), "laravel_auditing");
        assert!(!config.queue.enabled);
        assert_eq!(config.queue.default_connection, DEFAULT_QUEUE_CONNECTION);
        assert_eq!(config.request_timeout_seconds, 15);
        assert_eq!(config.retention_mode, RetentionMode::RetainThreshold);
    }

    #[test]
    fn parses_host_list_and_queue_settings() {
        let config = config_from(&[
            ("AUDIT_SEARCH_HOSTS", "es-1:9200, https://es-2:9243 ,"),
            ("AUDIT_SEARCH_INDEX", "audits_v2"),
            ("AUDIT_QUEUE_ENABLED", "TRUE"),
            ("AUDIT_QUEUE_NAME", "audits"),
            ("QUEUE_CONNECTION", "redis"),
            ("AUDIT_RETENTION_RESERVE_INCOMING", "1"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            config.hosts,
            vec!["es-1:9200".to_owned(), "https://es-2:9243".to_owned()]
        );
        assert_eq!(config.index.as_str(), "audits_v2");
        assert!(config.queue.enabled);
        assert_eq!(config.queue.queue.as_deref(), Some("audits"));
        assert_eq!(config.queue.connection, None);
        assert_eq!(config.queue.default_connection, "redis");
        assert_eq!(config.retention_mode, RetentionMode::ReserveIncoming);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(config_from(&[("AUDIT_QUEUE_ENABLED", "sometimes")]).is_err());
        assert!(config_from(&[("AUDIT_SEARCH_INDEX", "Audits")]).is_err());
        assert!(config_from(&[("AUDIT_SEARCH_TIMEOUT_SECONDS", "0")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("AUDIT_SEARCH_HOSTS", " , "), ("AUDIT_QUEUE_NAME", "  ")])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.hosts, vec!["localhost:9200".to_owned()]);
        assert_eq!(config.queue.queue, None);
    }
}
