//! Correlation diagnostics: daily linkage quality reporting.
//!
//! Computes linkage coverage, confidence distribution, non-linkage causes,
//! and hourly uncertainty flags for one (engagement, UTC day). Read-only and
//! independent of whether a correlation run just occurred; safe to run
//! concurrently with anything, though the numbers are a snapshot at query
//! time.

use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeMap, HashSet};
use tracelink_core::{
    CanonicalActivityEvent, CaseLinkEdge, ConfidenceDistribution, DailyReport, EngagementId,
    EventId, NonLinkageCause, UncertaintyItem,
};
use tracelink_storage::CorrelationStore;

const ROLE_AGGREGATE_DESCRIPTION: &str =
    "Events attributed to role cohort; no specific case match found.";
const NO_LINK_DESCRIPTION: &str = "Events with no case link and no role association.";
const UNCERTAINTY_RECOMMENDATION: &str =
    "Review activities in this hour for manual case assignment.";

/// An hour is flagged for review when at least this share of its events is
/// unlinked.
const UNCERTAINTY_THRESHOLD_PCT: f64 = 50.0;

/// Generates daily correlation quality reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationDiagnostics;

impl CorrelationDiagnostics {
    pub fn new() -> Self {
        Self
    }

    /// Compute the linkage quality report for one calendar day (UTC).
    ///
    /// A day with zero events returns an explicit empty report with all
    /// fields zeroed rather than omitting them.
    pub async fn daily_report<S: CorrelationStore>(
        &self,
        store: &S,
        engagement_id: EngagementId,
        day: NaiveDate,
    ) -> tracelink_core::TracelinkResult<DailyReport> {
        let events = store.event_list_in_day(engagement_id, day).await?;
        if events.is_empty() {
            return Ok(empty_report(engagement_id, day));
        }

        let day_event_ids: HashSet<EventId> = events.iter().map(|e| e.event_id).collect();
        let day_links: Vec<CaseLinkEdge> = store
            .edge_list(engagement_id, None)
            .await?
            .into_iter()
            .filter(|e| day_event_ids.contains(&e.event_id))
            .collect();

        let (real_links, role_links): (Vec<_>, Vec<_>) =
            day_links.into_iter().partition(|l| !l.is_role_aggregate());

        let linked_event_ids: HashSet<EventId> =
            real_links.iter().map(|l| l.event_id).collect();
        let linked_events = linked_event_ids.len();
        let total_events = events.len();
        let linked_pct = round2(linked_events as f64 / total_events as f64 * 100.0);

        let role_linked_events = role_links
            .iter()
            .map(|l| l.event_id)
            .collect::<HashSet<_>>()
            .len();

        Ok(DailyReport {
            date: day.to_string(),
            engagement_id,
            total_events,
            linked_events,
            linked_pct,
            confidence_distribution: confidence_distribution(&real_links),
            non_linkage_causes: non_linkage_causes(
                total_events,
                linked_events,
                role_linked_events,
            ),
            uncertainty_items: uncertainty_items(&events, &linked_event_ids),
        })
    }
}

/// Bucket real-link confidences. Buckets are checked highest-first with
/// inclusive bounds, so a boundary value lands in the higher bucket.
fn confidence_distribution(links: &[CaseLinkEdge]) -> ConfidenceDistribution {
    let mut dist = ConfidenceDistribution::default();
    for link in links {
        let c = link.confidence;
        if (0.9..=1.0).contains(&c) {
            dist.high += 1;
        } else if (0.7..=0.9).contains(&c) {
            dist.medium_high += 1;
        } else if (0.4..=0.7).contains(&c) {
            dist.medium += 1;
        } else if (0.0..=0.4).contains(&c) {
            dist.low += 1;
        }
    }
    dist
}

fn non_linkage_causes(
    total_events: usize,
    linked_events: usize,
    role_linked_events: usize,
) -> Vec<NonLinkageCause> {
    let unlinked = total_events
        .saturating_sub(linked_events)
        .saturating_sub(role_linked_events);

    let mut causes = Vec::new();
    if role_linked_events > 0 {
        causes.push(NonLinkageCause {
            cause: "role_aggregate_only".to_string(),
            event_count: role_linked_events,
            description: ROLE_AGGREGATE_DESCRIPTION.to_string(),
        });
    }
    if unlinked > 0 {
        causes.push(NonLinkageCause {
            cause: "no_link".to_string(),
            event_count: unlinked,
            description: NO_LINK_DESCRIPTION.to_string(),
        });
    }
    causes
}

/// Flag every UTC hour in which at least half of the events are unlinked.
/// Role-aggregate edges count as unlinked here.
fn uncertainty_items(
    events: &[CanonicalActivityEvent],
    linked_event_ids: &HashSet<EventId>,
) -> Vec<UncertaintyItem> {
    #[derive(Default)]
    struct HourStats {
        total: usize,
        unlinked: usize,
    }

    let mut hourly: BTreeMap<u32, HourStats> = BTreeMap::new();
    for event in events {
        let Some(ts) = event.timestamp_utc else {
            continue;
        };
        let stats = hourly.entry(ts.hour()).or_default();
        stats.total += 1;
        if !linked_event_ids.contains(&event.event_id) {
            stats.unlinked += 1;
        }
    }

    hourly
        .into_iter()
        .filter(|(_, stats)| stats.total > 0)
        .filter_map(|(hour, stats)| {
            let unlinked_pct = stats.unlinked as f64 / stats.total as f64 * 100.0;
            if unlinked_pct >= UNCERTAINTY_THRESHOLD_PCT {
                Some(UncertaintyItem {
                    hour,
                    total_events: stats.total,
                    unlinked_events: stats.unlinked,
                    unlinked_pct: round1(unlinked_pct),
                    recommendation: UNCERTAINTY_RECOMMENDATION.to_string(),
                })
            } else {
                None
            }
        })
        .collect()
}

fn empty_report(engagement_id: EngagementId, day: NaiveDate) -> DailyReport {
    DailyReport {
        date: day.to_string(),
        engagement_id,
        total_events: 0,
        linked_events: 0,
        linked_pct: 0.0,
        confidence_distribution: ConfidenceDistribution::default(),
        non_linkage_causes: Vec::new(),
        uncertainty_items: Vec::new(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Map;
    use tracelink_core::{new_edge_id, new_event_id, LinkMethod, MappingStatus, RawPayload};
    use tracelink_storage::MemoryStore;
    use uuid::Uuid;

    const DAY: (i32, u32, u32) = (2026, 1, 15);

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(DAY.0, DAY.1, DAY.2).unwrap()
    }

    fn make_event(engagement_id: EngagementId, hour: u32) -> CanonicalActivityEvent {
        CanonicalActivityEvent {
            event_id: new_event_id(),
            engagement_id,
            case_id: String::new(),
            activity_name: "Review".to_string(),
            timestamp_utc: Some(Utc.with_ymd_and_hms(DAY.0, DAY.1, DAY.2, hour, 0, 0).unwrap()),
            source_system: "taskmining".to_string(),
            performer_role_ref: Some("analyst".to_string()),
            evidence_refs: None,
            confidence_score: 0.5,
            mapping_status: MappingStatus::Mapped,
            raw_payload: RawPayload::new(),
        }
    }

    fn make_edge(
        event: &CanonicalActivityEvent,
        case_id: &str,
        method: LinkMethod,
        confidence: f64,
    ) -> CaseLinkEdge {
        CaseLinkEdge {
            edge_id: new_edge_id(),
            engagement_id: event.engagement_id,
            event_id: event.event_id,
            case_id: case_id.to_string(),
            method,
            confidence,
            explainability: Map::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_daily_report_mixed_day() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();

        let linked = make_event(eng, 10);
        let unlinked = make_event(eng, 14);
        store.event_insert(&linked).await.unwrap();
        store.event_insert(&unlinked).await.unwrap();
        store
            .edge_insert(&make_edge(&linked, "CASE-1", LinkMethod::Deterministic, 1.0))
            .await
            .unwrap();

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();

        assert_eq!(report.date, "2026-01-15");
        assert_eq!(report.engagement_id, eng);
        assert_eq!(report.total_events, 2);
        assert_eq!(report.linked_events, 1);
        assert_eq!(report.linked_pct, 50.0);
        assert_eq!(report.confidence_distribution.high, 1);
        assert_eq!(report.confidence_distribution.total(), 1);

        // Hour 10 is fully linked; hour 14 is 100% unlinked and flagged.
        assert_eq!(report.uncertainty_items.len(), 1);
        assert_eq!(report.uncertainty_items[0].hour, 14);
        assert_eq!(report.uncertainty_items[0].unlinked_pct, 100.0);

        // Partition: linked + role-aggregated + truly unlinked == total.
        let no_link = report
            .non_linkage_causes
            .iter()
            .find(|c| c.cause == "no_link")
            .unwrap();
        assert_eq!(report.linked_events + no_link.event_count, report.total_events);
    }

    #[tokio::test]
    async fn test_daily_report_empty_day() {
        let store = MemoryStore::new();
        let report = CorrelationDiagnostics::new()
            .daily_report(&store, Uuid::now_v7(), day())
            .await
            .unwrap();

        assert_eq!(report.total_events, 0);
        assert_eq!(report.linked_events, 0);
        assert_eq!(report.linked_pct, 0.0);
        assert_eq!(report.confidence_distribution.total(), 0);
        assert!(report.non_linkage_causes.is_empty());
        assert!(report.uncertainty_items.is_empty());
    }

    #[tokio::test]
    async fn test_role_aggregate_links_do_not_count_as_linked() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();
        let event = make_event(eng, 9);
        store.event_insert(&event).await.unwrap();
        store
            .edge_insert(&make_edge(
                &event,
                "ROLE_AGGREGATE:analyst",
                LinkMethod::RoleAggregate,
                0.0,
            ))
            .await
            .unwrap();

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();

        assert_eq!(report.linked_events, 0);
        assert_eq!(report.linked_pct, 0.0);
        assert_eq!(report.confidence_distribution.total(), 0);
        let cause = &report.non_linkage_causes[0];
        assert_eq!(cause.cause, "role_aggregate_only");
        assert_eq!(cause.event_count, 1);
    }

    #[tokio::test]
    async fn test_confidence_buckets_sum_to_real_link_count() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();

        let confidences = [1.0, 0.95, 0.8, 0.55, 0.41, 0.2];
        for confidence in confidences {
            let event = make_event(eng, 11);
            store.event_insert(&event).await.unwrap();
            store
                .edge_insert(&make_edge(&event, "CASE-1", LinkMethod::Assisted, confidence))
                .await
                .unwrap();
        }

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();

        let dist = report.confidence_distribution;
        assert_eq!(dist.high, 2);
        assert_eq!(dist.medium_high, 1);
        assert_eq!(dist.medium, 2);
        assert_eq!(dist.low, 1);
        assert_eq!(dist.total(), confidences.len());
    }

    #[tokio::test]
    async fn test_bucket_boundary_lands_high() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();
        let event = make_event(eng, 11);
        store.event_insert(&event).await.unwrap();
        store
            .edge_insert(&make_edge(&event, "CASE-1", LinkMethod::Assisted, 0.9))
            .await
            .unwrap();

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();
        assert_eq!(report.confidence_distribution.high, 1);
        assert_eq!(report.confidence_distribution.medium_high, 0);
    }

    #[tokio::test]
    async fn test_hour_at_exactly_fifty_percent_is_flagged() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();

        let linked = make_event(eng, 14);
        let unlinked = make_event(eng, 14);
        store.event_insert(&linked).await.unwrap();
        store.event_insert(&unlinked).await.unwrap();
        store
            .edge_insert(&make_edge(&linked, "CASE-1", LinkMethod::Deterministic, 1.0))
            .await
            .unwrap();

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();

        assert_eq!(report.uncertainty_items.len(), 1);
        let item = &report.uncertainty_items[0];
        assert_eq!(item.hour, 14);
        assert_eq!(item.total_events, 2);
        assert_eq!(item.unlinked_events, 1);
        assert_eq!(item.unlinked_pct, 50.0);
    }

    #[tokio::test]
    async fn test_hour_below_fifty_percent_not_flagged() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();

        let a = make_event(eng, 14);
        let b = make_event(eng, 14);
        let c = make_event(eng, 14);
        for e in [&a, &b, &c] {
            store.event_insert(e).await.unwrap();
        }
        for e in [&a, &b] {
            store
                .edge_insert(&make_edge(e, "CASE-1", LinkMethod::Deterministic, 1.0))
                .await
                .unwrap();
        }

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();
        assert!(report.uncertainty_items.is_empty());
    }

    #[tokio::test]
    async fn test_report_excludes_other_days() {
        let store = MemoryStore::new();
        let eng = Uuid::now_v7();

        let mut other_day = make_event(eng, 10);
        other_day.timestamp_utc = Some(Utc.with_ymd_and_hms(2026, 1, 16, 10, 0, 0).unwrap());
        store.event_insert(&other_day).await.unwrap();

        let report = CorrelationDiagnostics::new()
            .daily_report(&store, eng, day())
            .await
            .unwrap();
        assert_eq!(report.total_events, 0);
    }
}
