use std::fmt::{Display, Formatter};

use auditsearch_core::{AppError, AppResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout shared by the wire format and the index mapping.
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Change kind recorded by one audit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditEvent {
    /// Entity was created.
    Created,
    /// Entity attributes changed.
    Updated,
    /// Entity was deleted.
    Deleted,
    /// Soft-deleted entity was restored.
    Restored,
    /// Host-defined event name.
    Custom(String),
}

impl AuditEvent {
    /// Returns the stable storage value for this event.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
            Self::Custom(name) => name.as_str(),
        }
    }
}

impl From<String> for AuditEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "created" => Self::Created,
            "updated" => Self::Updated,
            "deleted" => Self::Deleted,
            "restored" => Self::Restored,
            _ => Self::Custom(value),
        }
    }
}

impl From<AuditEvent> for String {
    fn from(value: AuditEvent) -> Self {
        match value {
            AuditEvent::Custom(name) => name,
            other => other.as_str().to_owned(),
        }
    }
}

impl Display for AuditEvent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Change record of one audited entity, in the shape stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Change kind.
    pub event: AuditEvent,
    /// Kind discriminator of the audited entity.
    pub auditable_type: String,
    /// Identifier of the audited entity instance.
    pub auditable_id: String,
    /// Attribute values before the change.
    #[serde(default)]
    pub old_values: Map<String, Value>,
    /// Attribute values after the change.
    #[serde(default)]
    pub new_values: Map<String, Value>,
    /// Client IP address of the originating request.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// URL of the originating request.
    #[serde(default)]
    pub url: Option<String>,
    /// User agent of the originating request.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Identifier of the actor that made the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Kind of the actor that made the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    /// Comma-separated free-form labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Indexing timestamp. Overwritten by the pipeline on submission.
    #[serde(
        default,
        with = "audit_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuditRecord {
    /// Creates an audit record without request context or attribute changes.
    pub fn new(
        event: AuditEvent,
        auditable_type: impl Into<String>,
        auditable_id: impl Into<String>,
    ) -> AppResult<Self> {
        let auditable_type = auditable_type.into();
        let auditable_id = auditable_id.into();

        if auditable_type.trim().is_empty() {
            return Err(AppError::Validation(
                "audit auditable_type must not be empty".to_owned(),
            ));
        }

        if auditable_id.trim().is_empty() {
            return Err(AppError::Validation(
                "audit auditable_id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            event,
            auditable_type,
            auditable_id,
            old_values: Map::new(),
            new_values: Map::new(),
            ip_address: None,
            url: None,
            user_agent: None,
            user_id: None,
            user_type: None,
            tags: None,
            created_at: None,
        })
    }

    /// Returns the record with attribute changes attached.
    #[must_use]
    pub fn with_changes(
        mut self,
        old_values: Map<String, Value>,
        new_values: Map<String, Value>,
    ) -> Self {
        self.old_values = old_values;
        self.new_values = new_values;
        self
    }

    /// Returns the record with request context attached.
    #[must_use]
    pub fn with_request(
        mut self,
        ip_address: Option<String>,
        url: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.ip_address = ip_address;
        self.url = url;
        self.user_agent = user_agent;
        self
    }

    /// Returns the record attributed to one actor.
    #[must_use]
    pub fn with_user(mut self, user_type: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self.user_id = Some(user_id.into());
        self
    }

    /// Returns the record with its indexing timestamp replaced.
    #[must_use]
    pub fn stamped(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Parses a timestamp in the index layout, accepting RFC 3339 as a fallback.
pub fn parse_audit_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, AUDIT_TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            AppError::Validation(format!("invalid audit timestamp '{value}': {error}"))
        })
}

mod audit_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{AUDIT_TIMESTAMP_FORMAT, parse_audit_timestamp};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => {
                serializer.serialize_str(&timestamp.format(AUDIT_TIMESTAMP_FORMAT).to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|value| parse_audit_timestamp(value.as_str()).map_err(serde::de::Error::custom))
            .transpose()
    }
}
