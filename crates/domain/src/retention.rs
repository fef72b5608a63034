use auditsearch_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Upper bound on the result window of one retention pass.
pub const RETENTION_WINDOW_LIMIT: u64 = 10_000;

/// Reference to one audited entity and its retention threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditableRef {
    auditable_type: NonEmptyString,
    auditable_id: NonEmptyString,
    audit_threshold: i64,
}

impl AuditableRef {
    /// Creates an entity reference. A threshold of zero or less keeps every audit.
    pub fn new(
        auditable_type: impl Into<String>,
        auditable_id: impl Into<String>,
        audit_threshold: i64,
    ) -> AppResult<Self> {
        Ok(Self {
            auditable_type: NonEmptyString::new(auditable_type)?,
            auditable_id: NonEmptyString::new(auditable_id)?,
            audit_threshold,
        })
    }

    /// Returns the entity kind discriminator.
    #[must_use]
    pub fn auditable_type(&self) -> &str {
        self.auditable_type.as_str()
    }

    /// Returns the entity instance identifier.
    #[must_use]
    pub fn auditable_id(&self) -> &str {
        self.auditable_id.as_str()
    }

    /// Returns the configured number of audits to keep.
    #[must_use]
    pub fn audit_threshold(&self) -> i64 {
        self.audit_threshold
    }

    /// Returns whether retention applies to this entity at all.
    #[must_use]
    pub fn has_retention_limit(&self) -> bool {
        self.audit_threshold > 0
    }
}

/// How the retained window accounts for the audit that triggered enforcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionMode {
    /// Keep the newest `threshold` documents visible in the index.
    #[default]
    RetainThreshold,
    /// Keep `threshold - 1` visible documents, leaving one slot for an audit
    /// that is still in flight to the index.
    ReserveIncoming,
}

/// Query that selects the excess audit documents of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionQuery {
    auditable_type: String,
    auditable_id: String,
    skip: u64,
}

impl RetentionQuery {
    /// Builds the query for one entity, or `None` when retention is unlimited.
    #[must_use]
    pub fn for_entity(entity: &AuditableRef, mode: RetentionMode) -> Option<Self> {
        let threshold = u64::try_from(entity.audit_threshold()).ok()?;
        if threshold == 0 {
            return None;
        }

        let skip = match mode {
            RetentionMode::RetainThreshold => threshold,
            RetentionMode::ReserveIncoming => threshold - 1,
        };

        Some(Self {
            auditable_type: entity.auditable_type().to_owned(),
            auditable_id: entity.auditable_id().to_owned(),
            skip,
        })
    }

    /// Returns the entity kind filter.
    #[must_use]
    pub fn auditable_type(&self) -> &str {
        self.auditable_type.as_str()
    }

    /// Returns the entity identifier filter.
    #[must_use]
    pub fn auditable_id(&self) -> &str {
        self.auditable_id.as_str()
    }

    /// Number of newest documents skipped by the query.
    #[must_use]
    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// Maximum number of candidates returned by one pass.
    #[must_use]
    pub fn size(&self) -> u64 {
        RETENTION_WINDOW_LIMIT.saturating_sub(self.skip)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{AuditableRef, RETENTION_WINDOW_LIMIT, RetentionMode, RetentionQuery};

    fn entity(threshold: i64) -> AuditableRef {
        AuditableRef::new("Post", "42", threshold).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn non_positive_threshold_builds_no_query() {
        assert!(RetentionQuery::for_entity(&entity(0), RetentionMode::default()).is_none());
        assert!(RetentionQuery::for_entity(&entity(-3), RetentionMode::ReserveIncoming).is_none());
        assert!(!entity(0).has_retention_limit());
    }

    #[test]
    fn reserve_incoming_leaves_one_slot_open() {
        let query = RetentionQuery::for_entity(&entity(5), RetentionMode::ReserveIncoming);
        assert_eq!(query.as_ref().map(RetentionQuery::skip), Some(4));

        let query = RetentionQuery::for_entity(&entity(1), RetentionMode::ReserveIncoming);
        assert_eq!(query.as_ref().map(RetentionQuery::skip), Some(0));
        assert_eq!(
            query.as_ref().map(RetentionQuery::size),
            Some(RETENTION_WINDOW_LIMIT)
        );
    }

    #[test]
    fn query_carries_compound_entity_filter() {
        let query = RetentionQuery::for_entity(&entity(5), RetentionMode::RetainThreshold)
            .unwrap_or_else(|| unreachable!());
        assert_eq!(query.auditable_type(), "Post");
        assert_eq!(query.auditable_id(), "42");
        assert_eq!(query.skip(), 5);
        assert_eq!(query.size(), 9_995);
    }

    #[test]
    fn entity_reference_rejects_blank_identity() {
        assert!(AuditableRef::new("", "42", 5).is_err());
        assert!(AuditableRef::new("Post", " ", 5).is_err());
    }

    proptest! {
        #[test]
        fn window_never_exceeds_limit(threshold in 1_i64..50_000, reserve in any::<bool>()) {
            let mode = if reserve {
                RetentionMode::ReserveIncoming
            } else {
                RetentionMode::RetainThreshold
            };
            let query = RetentionQuery::for_entity(&entity(threshold), mode);
            prop_assert!(query.is_some());
            let query = query.unwrap_or_else(|| unreachable!());

            prop_assert!(query.size() <= RETENTION_WINDOW_LIMIT);
            prop_assert!(query.skip() >= RETENTION_WINDOW_LIMIT || query.skip() + query.size() == RETENTION_WINDOW_LIMIT);
            prop_assert_eq!(query.skip() + u64::from(reserve), threshold.unsigned_abs());
        }
    }
}
