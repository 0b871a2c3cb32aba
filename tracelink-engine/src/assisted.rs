//! Assisted (probabilistic) linkage: contextual similarity scoring.
//!
//! Links events the deterministic pass missed, by scoring them against every
//! case that already has at least one deterministic link. Three feature
//! dimensions feed the explainability vector:
//!
//! - `time_proximity`: distance from the case's known activity window
//! - `role_match`: performer role seen on the case before
//! - `system_match`: source system seen on the case before
//!
//! The combined score is a weighted average; events below the confidence
//! threshold stay unlinked and fall through to role aggregation.

use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracelink_core::{
    new_edge_id, CanonicalActivityEvent, CaseLinkEdge, EventId, LinkMethod, Timestamp,
};

const TIME_WEIGHT: f64 = 0.5;
const ROLE_WEIGHT: f64 = 0.3;
const SYSTEM_WEIGHT: f64 = 0.2;

/// Links below this combined score are not created.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Half-window for time-proximity scoring: full decay to 0.5 at this
/// distance, to 0.0 at twice it.
pub const DEFAULT_TIME_WINDOW_MINUTES: i64 = 30;

/// Tunables for the assisted pass.
#[derive(Debug, Clone, Copy)]
pub struct AssistedConfig {
    pub confidence_threshold: f64,
    pub time_window_minutes: i64,
}

impl Default for AssistedConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            time_window_minutes: DEFAULT_TIME_WINDOW_MINUTES,
        }
    }
}

/// Per-case features observed among deterministically-linked events.
#[derive(Debug, Clone, Default)]
pub struct CaseFeatures {
    pub timestamps: Vec<Timestamp>,
    pub roles: HashSet<String>,
    pub systems: HashSet<String>,
}

/// Transient feature index keyed by case id, rebuilt fresh on every assisted
/// invocation and never persisted.
///
/// Backed by a `BTreeMap` so iteration (and therefore score tie-breaking) is
/// deterministic: among equally-scored cases the lexicographically smallest
/// case id wins.
#[derive(Debug, Clone, Default)]
pub struct CaseFeatureIndex {
    cases: BTreeMap<String, CaseFeatures>,
}

impl CaseFeatureIndex {
    /// Build the index from existing edges and their events. Only
    /// deterministic edges contribute features.
    pub fn from_edges(edges: &[CaseLinkEdge], events: &[CanonicalActivityEvent]) -> Self {
        let by_id: HashMap<EventId, &CanonicalActivityEvent> =
            events.iter().map(|e| (e.event_id, e)).collect();

        let mut cases: BTreeMap<String, CaseFeatures> = BTreeMap::new();
        for edge in edges {
            if edge.method != LinkMethod::Deterministic {
                continue;
            }
            let Some(event) = by_id.get(&edge.event_id) else {
                continue;
            };
            let features = cases.entry(edge.case_id.clone()).or_default();
            if let Some(ts) = event.timestamp_utc {
                features.timestamps.push(ts);
            }
            if let Some(role) = &event.performer_role_ref {
                features.roles.insert(role.clone());
            }
            features.systems.insert(event.source_system.clone());
        }

        Self { cases }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &CaseFeatures)> {
        self.cases.iter()
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// 1.0 at zero distance from the nearest known case timestamp, decaying
/// linearly to 0.5 at the window and to 0.0 at twice the window.
fn time_proximity_score(
    event_ts: Option<Timestamp>,
    case_timestamps: &[Timestamp],
    window_minutes: i64,
) -> f64 {
    let Some(event_ts) = event_ts else {
        return 0.0;
    };
    let Some(min_delta) = case_timestamps
        .iter()
        .map(|ts| (event_ts - *ts).abs())
        .min()
    else {
        return 0.0;
    };

    let window = Duration::minutes(window_minutes);
    let delta_ms = min_delta.num_milliseconds() as f64;
    let window_ms = window.num_milliseconds() as f64;

    if min_delta <= window {
        // 0.5..1.0 within the window
        return 1.0 - (delta_ms / window_ms) * 0.5;
    }
    if min_delta <= window * 2 {
        let fraction = (delta_ms - window_ms) / window_ms;
        return (0.5 - fraction * 0.5).max(0.0);
    }
    0.0
}

/// 1.0 iff the event's performer role appears on the case; 0.0 when either
/// side is empty/unset.
fn role_match_score(event_role: Option<&str>, case_roles: &HashSet<String>) -> f64 {
    match event_role {
        Some(role) if !case_roles.is_empty() && case_roles.contains(role) => 1.0,
        _ => 0.0,
    }
}

/// 1.0 iff the event's source system appears on the case.
fn system_match_score(event_system: &str, case_systems: &HashSet<String>) -> f64 {
    if !case_systems.is_empty() && case_systems.contains(event_system) {
        1.0
    } else {
        0.0
    }
}

fn combined_score(time_prox: f64, role_match: f64, system_match: f64) -> f64 {
    TIME_WEIGHT * time_prox + ROLE_WEIGHT * role_match + SYSTEM_WEIGHT * system_match
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// ============================================================================
// LINKER
// ============================================================================

/// Probabilistic case linker using time, role, and system features.
#[derive(Debug, Clone, Default)]
pub struct AssistedLinker {
    config: AssistedConfig,
}

impl AssistedLinker {
    pub fn new(config: AssistedConfig) -> Self {
        Self { config }
    }

    /// Score each unlinked event against every known case and link it to the
    /// best match at or above the confidence threshold.
    ///
    /// When the index has no cases at all the pass is a no-op: there is
    /// nothing to compare against, and the pass never fabricates cases.
    pub fn link(
        &self,
        events: &[CanonicalActivityEvent],
        index: &CaseFeatureIndex,
    ) -> Vec<CaseLinkEdge> {
        if index.is_empty() {
            tracing::info!("assisted pass skipped: no cases with deterministic links");
            return Vec::new();
        }

        let mut edges = Vec::new();

        for event in events {
            let mut best_case_id: Option<&str> = None;
            let mut best_score = 0.0;
            let mut best_explainability = serde_json::Map::new();

            for (case_id, features) in index.iter() {
                let time_prox = time_proximity_score(
                    event.timestamp_utc,
                    &features.timestamps,
                    self.config.time_window_minutes,
                );
                let role_match =
                    role_match_score(event.performer_role_ref.as_deref(), &features.roles);
                let system_match = system_match_score(&event.source_system, &features.systems);
                let combined = combined_score(time_prox, role_match, system_match);

                if combined > best_score {
                    best_score = combined;
                    best_case_id = Some(case_id);
                    let mut explainability = serde_json::Map::new();
                    explainability.insert("time_proximity".to_string(), json!(round4(time_prox)));
                    explainability.insert("role_match".to_string(), json!(round4(role_match)));
                    explainability.insert("system_match".to_string(), json!(round4(system_match)));
                    explainability.insert("combined".to_string(), json!(round4(combined)));
                    explainability.insert(
                        "time_window_minutes".to_string(),
                        json!(self.config.time_window_minutes),
                    );
                    best_explainability = explainability;
                }
            }

            if let Some(case_id) = best_case_id {
                if best_score >= self.config.confidence_threshold {
                    edges.push(CaseLinkEdge {
                        edge_id: new_edge_id(),
                        engagement_id: event.engagement_id,
                        event_id: event.event_id,
                        case_id: case_id.to_string(),
                        method: LinkMethod::Assisted,
                        confidence: best_score,
                        explainability: best_explainability,
                        created_at: Utc::now(),
                    });
                }
            }
        }

        if !edges.is_empty() {
            tracing::info!(edges = edges.len(), "assisted pass created edges");
        }

        edges
    }
}

// =============================================================================
// TESTS
// =============================================================================
