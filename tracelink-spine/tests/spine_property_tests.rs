//! Property-Based Tests for the Event Spine Builder
//!
//! Properties:
//! - `build_spine` output is sorted non-decreasing by timestamp and contains
//!   no two entries with the same (case_id, activity_name) within the dedup
//!   tolerance window.
//! - `build_spine` is idempotent: running it on its own output yields the
//!   same sequence.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tracelink_core::{
    new_event_id, CanonicalActivityEvent, MappingStatus, RawPayload, Timestamp,
};
use tracelink_spine::{EventSpineBuilder, SpineConfig, DEFAULT_DEDUP_TOLERANCE_SECS};
use uuid::Uuid;

// ============================================================================
// ARBITRATORS
// ============================================================================

fn arb_event() -> impl Strategy<Value = CanonicalActivityEvent> {
    (
        prop_oneof![Just("C1"), Just("C2"), Just("C3")],
        prop_oneof![Just("Review"), Just("Approve")],
        // Offsets within a single hour so near-duplicates actually occur.
        proptest::option::weighted(0.9, 0i64..3600),
        0.0f64..=1.0,
    )
        .prop_map(|(case_id, activity, offset_secs, confidence)| {
            let base = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
            CanonicalActivityEvent {
                event_id: new_event_id(),
                engagement_id: Uuid::nil(),
                case_id: case_id.to_string(),
                activity_name: activity.to_string(),
                timestamp_utc: offset_secs.map(|s| base + chrono::Duration::seconds(s)),
                source_system: "taskmining".to_string(),
                performer_role_ref: None,
                evidence_refs: None,
                confidence_score: confidence,
                mapping_status: MappingStatus::Mapped,
                raw_payload: RawPayload::new(),
            }
        })
}

fn key(event: &CanonicalActivityEvent) -> Option<Timestamp> {
    event.timestamp_utc
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_spine_sorted_non_decreasing(events in proptest::collection::vec(arb_event(), 0..40)) {
        let builder = EventSpineBuilder::new(Uuid::nil(), SpineConfig::default());
        let spine = builder.build_spine(events);
        for pair in spine.windows(2) {
            prop_assert!(key(&pair[0]) <= key(&pair[1]));
        }
    }

    #[test]
    fn prop_spine_has_no_near_duplicates(events in proptest::collection::vec(arb_event(), 0..40)) {
        let builder = EventSpineBuilder::new(Uuid::nil(), SpineConfig::default());
        let spine = builder.build_spine(events);
        for (i, a) in spine.iter().enumerate() {
            for b in spine.iter().skip(i + 1) {
                if a.case_id == b.case_id && a.activity_name == b.activity_name {
                    if let (Some(ts_a), Some(ts_b)) = (a.timestamp_utc, b.timestamp_utc) {
                        let delta = (ts_a - ts_b).abs().num_seconds();
                        prop_assert!(delta > DEFAULT_DEDUP_TOLERANCE_SECS);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_spine_idempotent(events in proptest::collection::vec(arb_event(), 0..40)) {
        let builder = EventSpineBuilder::new(Uuid::nil(), SpineConfig::default());
        let once = builder.build_spine(events);
        let twice = builder.build_spine(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_spine_never_invents_or_drops_beyond_dedup(events in proptest::collection::vec(arb_event(), 0..40)) {
        let builder = EventSpineBuilder::new(Uuid::nil(), SpineConfig::default());
        let input_len = events.len();
        let spine = builder.build_spine(events);
        prop_assert!(spine.len() <= input_len);
    }
}
