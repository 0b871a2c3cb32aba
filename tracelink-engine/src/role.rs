//! Role-cohort fallback: last-resort attribution for unlinkable events.
//!
//! Guarantees that every event is accounted for in aggregate reporting even
//! when no case-level link could be established. Events are attributed to a
//! synthetic pseudo-case per performer role.

use chrono::Utc;
use serde_json::json;
use tracelink_core::{
    new_edge_id, CanonicalActivityEvent, CaseLinkEdge, LinkMethod, ROLE_AGGREGATE_PREFIX,
    UNKNOWN_ROLE,
};

const REASON: &str = "no_deterministic_or_assisted_match";

/// Attributes events with no edge at all to a per-role cohort.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAssociator;

impl RoleAssociator {
    pub fn new() -> Self {
        Self
    }

    /// Emit one `ROLE_AGGREGATE:<role>` edge per event, at confidence 0.0.
    ///
    /// Empty input yields empty output, never an error.
    pub fn associate(&self, events: &[CanonicalActivityEvent]) -> Vec<CaseLinkEdge> {
        let edges: Vec<CaseLinkEdge> = events
            .iter()
            .map(|event| {
                let role = event
                    .performer_role_ref
                    .as_deref()
                    .unwrap_or(UNKNOWN_ROLE);

                let mut explainability = serde_json::Map::new();
                explainability.insert("performer_role".to_string(), json!(role));
                explainability.insert("reason".to_string(), json!(REASON));

                CaseLinkEdge {
                    edge_id: new_edge_id(),
                    engagement_id: event.engagement_id,
                    event_id: event.event_id,
                    case_id: format!("{ROLE_AGGREGATE_PREFIX}{role}"),
                    method: LinkMethod::RoleAggregate,
                    confidence: 0.0,
                    explainability,
                    created_at: Utc::now(),
                }
            })
            .collect();

        if !edges.is_empty() {
            tracing::info!(edges = edges.len(), "role-aggregate pass created edges");
        }

        edges
    }
}
