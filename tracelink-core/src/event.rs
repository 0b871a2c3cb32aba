//! Canonical activity event - the unit of work for correlation.
//!
//! Every raw record from a source system (task-mining agent, process-mining
//! export, ERP/CRM log) is normalized into exactly one
//! `CanonicalActivityEvent` by the Event Spine Builder. The event is
//! immutable after canonicalization except for `mapping_status`, which may be
//! flipped retroactively when the set of known activities changes.

use crate::{EngagementId, EventId, Timestamp};
use serde::{Deserialize, Serialize};

/// Opaque passthrough of source-specific fields (e.g. `window_title`).
///
/// Kept as a string-keyed JSON map rather than typed fields because the set
/// of source systems is open-ended; the deterministic linker reads
/// `window_title` out of this blob later.
pub type RawPayload = serde_json::Map<String, serde_json::Value>;

/// Whether an event's activity name resolved to a known activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Mapped,
    Unmapped,
}

/// A normalized activity record with a uniform schema regardless of source.
///
/// Invariant: `case_id` and `activity_name` are never empty after
/// canonicalization. An unmapped activity name falls back to the literal
/// `"unknown"`; a missing case id is logged at canonicalization time but the
/// event is retained with an empty-string sentinel, never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalActivityEvent {
    pub event_id: EventId,
    pub engagement_id: EngagementId,
    /// Real case id, or an empty-string sentinel before linkage.
    pub case_id: String,
    pub activity_name: String,
    /// Missing timestamps are preserved as `None` and sort first in the spine.
    pub timestamp_utc: Option<Timestamp>,
    pub source_system: String,
    pub performer_role_ref: Option<String>,
    pub evidence_refs: Option<Vec<String>>,
    /// Confidence assigned at canonicalization time, 0.0..=1.0.
    pub confidence_score: f64,
    pub mapping_status: MappingStatus,
    pub raw_payload: RawPayload,
}

impl CanonicalActivityEvent {
    /// The `window_title`-like text the deterministic linker extracts from,
    /// if the source captured one.
    pub fn window_title(&self) -> Option<&str> {
        self.raw_payload
            .get("window_title")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}
