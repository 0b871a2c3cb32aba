//! Canonicalization, deduplication, and chronological ordering of raw events.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracelink_core::{
    new_event_id, CanonicalActivityEvent, EngagementId, MappingStatus, RawPayload, Timestamp,
};

/// Default deduplication tolerance: events within this window for the same
/// (case_id, activity_name) are considered the same underlying occurrence.
pub const DEFAULT_DEDUP_TOLERANCE_SECS: i64 = 60;

/// Per-source field-mapping rules and dedup tolerance.
#[derive(Debug, Clone)]
pub struct SpineConfig {
    /// `{source_system: {source_field: canonical_field}}`. Any canonical
    /// field not produced by the mapping falls back to a same-named field on
    /// the raw record.
    pub mapping_rules: HashMap<String, HashMap<String, String>>,
    pub dedup_tolerance_secs: i64,
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            mapping_rules: HashMap::new(),
            dedup_tolerance_secs: DEFAULT_DEDUP_TOLERANCE_SECS,
        }
    }
}

/// Builds a chronological event spine from raw multi-source events.
#[derive(Debug, Clone)]
pub struct EventSpineBuilder {
    engagement_id: EngagementId,
    config: SpineConfig,
}

impl EventSpineBuilder {
    pub fn new(engagement_id: EngagementId, config: SpineConfig) -> Self {
        Self {
            engagement_id,
            config,
        }
    }

    /// Normalize raw events from one source system to the canonical schema.
    ///
    /// Events are never dropped here: an empty activity name is flagged
    /// `Unmapped` and falls back to `raw.name` or `"unknown"`; a missing
    /// case id is logged but the event is still emitted.
    pub fn canonicalize(
        &self,
        raw_events: &[RawPayload],
        source_system: &str,
    ) -> Vec<CanonicalActivityEvent> {
        let empty = HashMap::new();
        let rules = self
            .config
            .mapping_rules
            .get(source_system)
            .unwrap_or(&empty);

        raw_events
            .iter()
            .map(|raw| self.apply_mapping(raw, rules, source_system))
            .collect()
    }

    /// Map a single raw record to canonical form. Explicit mapping rules take
    /// precedence; same-named raw fields are the fallback.
    fn apply_mapping(
        &self,
        raw: &RawPayload,
        rules: &HashMap<String, String>,
        source_system: &str,
    ) -> CanonicalActivityEvent {
        let mut mapped: RawPayload = RawPayload::new();
        for (src_field, canon_field) in rules {
            if let Some(value) = raw.get(src_field) {
                mapped.insert(canon_field.clone(), value.clone());
            }
        }

        let case_id = resolve_string(&mapped, raw, "case_id").unwrap_or_default();
        let mut activity_name = resolve_string(&mapped, raw, "activity_name").unwrap_or_default();
        let timestamp_utc = resolve_value(&mapped, raw, "timestamp_utc")
            .and_then(|v| parse_timestamp(v, source_system));
        let performer_role_ref = resolve_string(&mapped, raw, "performer_role_ref");
        let evidence_refs = resolve_value(&mapped, raw, "evidence_refs").and_then(parse_string_list);
        let confidence_score = resolve_value(&mapped, raw, "confidence_score")
            .and_then(parse_confidence)
            .unwrap_or(0.0);

        let mut mapping_status = MappingStatus::Mapped;

        if case_id.is_empty() {
            tracing::warn!(
                source_system = source_system,
                "event missing case_id after mapping; retained"
            );
        }

        if activity_name.is_empty() {
            mapping_status = MappingStatus::Unmapped;
            activity_name = resolve_string(&mapped, raw, "name")
                .unwrap_or_else(|| "unknown".to_string());
        }

        CanonicalActivityEvent {
            event_id: new_event_id(),
            engagement_id: self.engagement_id,
            case_id,
            activity_name,
            timestamp_utc,
            source_system: source_system.to_string(),
            performer_role_ref,
            evidence_refs,
            confidence_score,
            mapping_status,
            raw_payload: raw.clone(),
        }
    }

    /// Remove duplicate events, retaining the highest-confidence version.
    ///
    /// Duplicates share (case_id, activity_name) with timestamps no more than
    /// the tolerance apart (`<=` at the boundary). On a hit, higher confidence
    /// replaces the earlier-seen event; ties keep the earlier-scanned one.
    /// Events with no timestamp never deduplicate.
    pub fn deduplicate(
        &self,
        events: Vec<CanonicalActivityEvent>,
    ) -> Vec<CanonicalActivityEvent> {
        if events.is_empty() {
            return Vec::new();
        }

        let mut sorted = events;
        sorted.sort_by_key(sort_key);

        let mut deduped: Vec<CanonicalActivityEvent> = Vec::new();
        for event in sorted {
            let mut merged = false;
            for existing in deduped.iter_mut() {
                if self.is_duplicate(existing, &event) {
                    if event.confidence_score > existing.confidence_score {
                        *existing = event.clone();
                    }
                    merged = true;
                    break;
                }
            }
            if !merged {
                deduped.push(event);
            }
        }

        deduped
    }

    fn is_duplicate(&self, a: &CanonicalActivityEvent, b: &CanonicalActivityEvent) -> bool {
        if a.case_id != b.case_id || a.activity_name != b.activity_name {
            return false;
        }
        match (a.timestamp_utc, b.timestamp_utc) {
            (Some(ts_a), Some(ts_b)) => {
                let delta = (ts_a - ts_b).abs();
                delta.num_seconds() <= self.config.dedup_tolerance_secs
            }
            _ => false,
        }
    }

    /// Build the complete event spine: deduplicate and order by timestamp.
    ///
    /// Missing timestamps sort first. The result is a finite ordered
    /// sequence; calling this again on its own output yields the same
    /// sequence.
    pub fn build_spine(
        &self,
        events: Vec<CanonicalActivityEvent>,
    ) -> Vec<CanonicalActivityEvent> {
        let mut spine = self.deduplicate(events);
        spine.sort_by_key(sort_key);
        spine
    }

    /// Flag events whose activity name is not in the known set as `Unmapped`.
    ///
    /// Matching events are left untouched (an already-unmapped event is never
    /// forced back to `Mapped`), and events are never removed.
    pub fn check_unmapped(
        &self,
        events: &mut [CanonicalActivityEvent],
        known_activities: &HashSet<String>,
    ) {
        for event in events.iter_mut() {
            if !known_activities.contains(&event.activity_name) {
                event.mapping_status = MappingStatus::Unmapped;
            }
        }
    }
}

fn sort_key(event: &CanonicalActivityEvent) -> Option<Timestamp> {
    // None sorts before Some, so a missing timestamp sorts first.
    event.timestamp_utc
}

/// Mapped value if present and non-empty, else the same-named raw field.
fn resolve_value<'a>(mapped: &'a RawPayload, raw: &'a RawPayload, field: &str) -> Option<&'a Value> {
    mapped
        .get(field)
        .filter(|v| !value_is_empty(v))
        .or_else(|| raw.get(field))
}

fn resolve_string(mapped: &RawPayload, raw: &RawPayload, field: &str) -> Option<String> {
    resolve_value(mapped, raw, field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Parse an RFC 3339 timestamp; a naive timestamp is treated as already UTC.
fn parse_timestamp(value: &Value, source_system: &str) -> Option<Timestamp> {
    let text = value.as_str()?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    tracing::warn!(
        source_system = source_system,
        timestamp = text,
        "unparseable timestamp; event retained without one"
    );
    None
}

fn parse_confidence(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
    )
}

// =============================================================================
// TESTS
// =============================================================================
