//! Domain entities and invariants of the audit index.

#![forbid(unsafe_code)]

mod audit;
mod index;
mod retention;

pub use audit::{AUDIT_TIMESTAMP_FORMAT, AuditEvent, AuditRecord, parse_audit_timestamp};
pub use index::{
    AUDIT_FIELD_MAPPING, INDEX_DATE_FORMAT, IndexDocument, IndexName, IndexSettings, MappedField,
    MappedFieldType, WRITE_ALIAS_SUFFIX,
};
pub use retention::{AuditableRef, RETENTION_WINDOW_LIMIT, RetentionMode, RetentionQuery};
