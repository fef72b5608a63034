use std::fmt::{Display, Formatter};

use auditsearch_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AuditRecord;

/// Suffix appended to an index name to form its write alias.
pub const WRITE_ALIAS_SUFFIX: &str = "_write";

/// Validated name of the search index holding audit documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexName(NonEmptyString);

impl IndexName {
    /// Creates a validated index name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)?;
        let name = value.as_str();

        if name != name.to_lowercase() {
            return Err(AppError::Validation(format!(
                "index name '{name}' must be lowercase"
            )));
        }

        if name.starts_with(['-', '_', '+']) || name == "." || name == ".." {
            return Err(AppError::Validation(format!(
                "index name '{name}' has an invalid leading character"
            )));
        }

        if let Some(character) = name.chars().find(|character| {
            character.is_whitespace()
                || matches!(
                    character,
                    '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' | ',' | '#' | ':'
                )
        }) {
            return Err(AppError::Validation(format!(
                "index name '{name}' must not contain '{character}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the alias writers use to stay decoupled from the concrete index.
    #[must_use]
    pub fn write_alias(&self) -> String {
        format!("{}{WRITE_ALIAS_SUFFIX}", self.as_str())
    }
}

impl Display for IndexName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Shard layout applied when the audit index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSettings {
    /// Primary shard count.
    pub number_of_shards: u16,
    /// Replica count per primary shard.
    pub number_of_replicas: u16,
}

impl IndexSettings {
    /// Fixed layout of the audit index.
    pub const AUDIT: Self = Self {
        number_of_shards: 3,
        number_of_replicas: 0,
    };
}

/// Date layout declared on mapped timestamp fields, in the engine's pattern syntax.
pub const INDEX_DATE_FORMAT: &str = "yyyy-MM-dd HH:mm:ss";

/// Storage type of one explicitly mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedFieldType {
    /// Exact-match, non-analyzed string.
    Keyword,
    /// Timestamp stored with [`INDEX_DATE_FORMAT`].
    Date,
}

/// One explicitly mapped field, addressed by a dot-separated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedField {
    /// Dot-separated path inside the document.
    pub path: &'static str,
    /// Storage type.
    pub field_type: MappedFieldType,
}

impl MappedField {
    const fn keyword(path: &'static str) -> Self {
        Self {
            path,
            field_type: MappedFieldType::Keyword,
        }
    }

    const fn date(path: &'static str) -> Self {
        Self {
            path,
            field_type: MappedFieldType::Date,
        }
    }
}

/// Fixed field mapping of the audit index. Unlisted fields are mapped dynamically.
pub const AUDIT_FIELD_MAPPING: &[MappedField] = &[
    MappedField::keyword("event"),
    MappedField::keyword("auditable_type"),
    MappedField::keyword("auditable_id"),
    MappedField::keyword("ip_address"),
    MappedField::keyword("url"),
    MappedField::keyword("user_agent"),
    MappedField::date("created_at"),
    MappedField::date("old_values.created_at"),
    MappedField::date("old_values.updated_at"),
    MappedField::date("old_values.deleted_at"),
    MappedField::date("new_values.created_at"),
    MappedField::date("new_values.updated_at"),
    MappedField::date("new_values.deleted_at"),
];

/// Audit record paired with the identifier it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    id: Uuid,
    record: AuditRecord,
}

impl IndexDocument {
    /// Wraps a record under a fresh random identifier.
    #[must_use]
    pub fn new(record: AuditRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
        }
    }

    /// Returns the document identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the stored audit record.
    #[must_use]
    pub fn record(&self) -> &AuditRecord {
        &self.record
    }
}
