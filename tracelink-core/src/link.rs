//! Case-link edges: the directed linkage fact `event -> case`.

use crate::{EdgeId, EngagementId, EventId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the synthetic case id used by the role-aggregation fallback.
pub const ROLE_AGGREGATE_PREFIX: &str = "ROLE_AGGREGATE:";

/// Role placeholder when an event has no performer role reference.
pub const UNKNOWN_ROLE: &str = "unknown_role";

/// Which pass produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    /// Explicit case id extracted from window-title-like text.
    Deterministic,
    /// Probabilistic scoring against the case feature index.
    Assisted,
    /// Fallback attribution to a per-role cohort.
    RoleAggregate,
}

impl fmt::Display for LinkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkMethod::Deterministic => "deterministic",
            LinkMethod::Assisted => "assisted",
            LinkMethod::RoleAggregate => "role_aggregate",
        };
        write!(f, "{s}")
    }
}

/// A directed linkage fact: event -> case.
///
/// Created exactly once per (event, pass) by whichever pass resolves it;
/// never mutated, never deleted by the engine itself. The explainability map
/// carries the feature scores and/or triggering text that produced the match,
/// for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLinkEdge {
    pub edge_id: EdgeId,
    pub engagement_id: EngagementId,
    pub event_id: EventId,
    /// Real case id, or `ROLE_AGGREGATE:<role>` for the fallback cohort.
    pub case_id: String,
    pub method: LinkMethod,
    pub confidence: f64,
    pub explainability: serde_json::Map<String, serde_json::Value>,
    pub created_at: Timestamp,
}

impl CaseLinkEdge {
    /// True when this edge attributes the event to a role cohort rather than
    /// a real case. Role-aggregate edges do not count as "linked" anywhere
    /// in reporting.
    pub fn is_role_aggregate(&self) -> bool {
        self.case_id.starts_with(ROLE_AGGREGATE_PREFIX)
    }
}

// ============================================================================
// LISTING SUPPORT
// ============================================================================

/// Filter for edge listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeFilter {
    pub case_id: Option<String>,
    pub method: Option<LinkMethod>,
    pub min_confidence: Option<f64>,
}

impl EdgeFilter {
    pub fn matches(&self, edge: &CaseLinkEdge) -> bool {
        if let Some(case_id) = &self.case_id {
            if &edge.case_id != case_id {
                return false;
            }
        }
        if let Some(method) = self.method {
            if edge.method != method {
                return false;
            }
        }
        if let Some(min) = self.min_confidence {
            if edge.confidence < min {
                return false;
            }
        }
        true
    }
}

/// Limit/offset paging for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn edge(case_id: &str, method: LinkMethod, confidence: f64) -> CaseLinkEdge {
        CaseLinkEdge {
            edge_id: Uuid::now_v7(),
            engagement_id: Uuid::now_v7(),
            event_id: Uuid::now_v7(),
            case_id: case_id.to_string(),
            method,
            confidence,
            explainability: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_role_aggregate() {
        let real = edge("INC0012345", LinkMethod::Deterministic, 1.0);
        assert!(!real.is_role_aggregate());

        let cohort = edge("ROLE_AGGREGATE:analyst", LinkMethod::RoleAggregate, 0.0);
        assert!(cohort.is_role_aggregate());
    }

    #[test]
    fn test_link_method_serializes_snake_case() {
        let json = serde_json::to_string(&LinkMethod::RoleAggregate).unwrap();
        assert_eq!(json, "\"role_aggregate\"");
        assert_eq!(LinkMethod::Assisted.to_string(), "assisted");
    }

    #[test]
    fn test_edge_filter_matches_all_dimensions() {
        let e = edge("CASE-111", LinkMethod::Assisted, 0.55);

        assert!(EdgeFilter::default().matches(&e));
        assert!(EdgeFilter {
            case_id: Some("CASE-111".to_string()),
            method: Some(LinkMethod::Assisted),
            min_confidence: Some(0.5),
        }
        .matches(&e));

        assert!(!EdgeFilter {
            case_id: Some("CASE-222".to_string()),
            ..Default::default()
        }
        .matches(&e));
        assert!(!EdgeFilter {
            method: Some(LinkMethod::Deterministic),
            ..Default::default()
        }
        .matches(&e));
        assert!(!EdgeFilter {
            min_confidence: Some(0.6),
            ..Default::default()
        }
        .matches(&e));
    }
}
