//! TRACELINK Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod error;
pub mod event;
pub mod link;
pub mod report;

pub use error::{CorrelationError, StorageError, TracelinkError, TracelinkResult};
pub use event::{CanonicalActivityEvent, MappingStatus, RawPayload};
pub use link::{
    CaseLinkEdge, EdgeFilter, LinkMethod, Page, ROLE_AGGREGATE_PREFIX, UNKNOWN_ROLE,
};
pub use report::{
    ConfidenceDistribution, CorrelationRunSummary, DailyReport, NonLinkageCause, UncertaintyItem,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Engagement scope identifier. All matching is scoped to one engagement.
pub type EngagementId = Uuid;

/// Canonical event identifier using UUIDv7 for timestamp-sortable IDs.
pub type EventId = Uuid;

/// Case-link edge identifier.
pub type EdgeId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 event id (timestamp-sortable).
pub fn new_event_id() -> EventId {
    Uuid::now_v7()
}

/// Generate a new UUIDv7 edge id.
pub fn new_edge_id() -> EdgeId {
    Uuid::now_v7()
}

/// Entity type discriminator used by storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Event,
    Edge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_id_is_sortable() {
        let a = new_event_id();
        let b = new_event_id();
        // UUIDv7 embeds a timestamp, so later ids never sort below earlier ones.
        assert!(a <= b);
    }
}
