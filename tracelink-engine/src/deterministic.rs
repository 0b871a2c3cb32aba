//! Deterministic linkage: explicit case-id extraction from window titles.

use crate::pattern::PatternTable;
use chrono::Utc;
use serde_json::json;
use tracelink_core::{new_edge_id, CanonicalActivityEvent, CaseLinkEdge, LinkMethod};

/// Extracts explicit case/ticket identifiers from captured window-title text
/// and links the owning events at confidence 1.0.
///
/// Extraction failure is not an error: an event with no title or no matching
/// pattern is simply passed through unlinked for the next pass.
#[derive(Debug, Clone, Default)]
pub struct DeterministicLinker {
    patterns: PatternTable,
}

impl DeterministicLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom pattern table instead of the built-in one.
    pub fn with_patterns(patterns: PatternTable) -> Self {
        Self { patterns }
    }

    /// Pure extraction: first pattern match in `text`, uppercased.
    pub fn extract_case_id(&self, text: &str) -> Option<String> {
        self.patterns.extract(text)
    }

    /// Attempt extraction for every event; emit one edge per hit.
    ///
    /// Events whose raw payload carries no window-title field are skipped
    /// silently. No side effects beyond constructing edges; persistence is
    /// the caller's responsibility.
    pub fn link_events(&self, events: &[CanonicalActivityEvent]) -> Vec<CaseLinkEdge> {
        let mut edges = Vec::new();

        for event in events {
            let Some(title) = event.window_title() else {
                continue;
            };
            let Some(case_id) = self.extract_case_id(title) else {
                continue;
            };

            let mut explainability = serde_json::Map::new();
            explainability.insert("window_title".to_string(), json!(title));
            explainability.insert("extracted_id".to_string(), json!(case_id));

            edges.push(CaseLinkEdge {
                edge_id: new_edge_id(),
                engagement_id: event.engagement_id,
                event_id: event.event_id,
                case_id,
                method: LinkMethod::Deterministic,
                confidence: 1.0,
                explainability,
                created_at: Utc::now(),
            });
        }

        if !edges.is_empty() {
            tracing::info!(edges = edges.len(), "deterministic pass created edges");
        }

        edges
    }
}
