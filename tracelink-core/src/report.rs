//! Report shapes produced by the correlation pipeline and diagnostics.
//!
//! These are plain serializable structs so a request-handling layer can emit
//! them directly; no computation lives here.

use crate::EngagementId;
use serde::{Deserialize, Serialize};

/// Summary of one correlation run over an engagement's full event set.
///
/// A run always returns a summary, even when zero events exist (all counts
/// zero) - there is no special empty-state error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRunSummary {
    pub engagement_id: EngagementId,
    pub total_events: usize,
    pub deterministic_count: usize,
    pub assisted_count: usize,
    pub role_aggregate_count: usize,
    /// Events that received no edge at all this run.
    pub unlinked_count: usize,
    /// Sum of the three pass counts.
    pub links_created: usize,
}

impl CorrelationRunSummary {
    /// All-zero summary for an engagement with no events.
    pub fn empty(engagement_id: EngagementId) -> Self {
        Self {
            engagement_id,
            total_events: 0,
            deterministic_count: 0,
            assisted_count: 0,
            role_aggregate_count: 0,
            unlinked_count: 0,
            links_created: 0,
        }
    }
}

/// Confidence-score histogram over real (non-role-aggregate) links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    /// 0.9..=1.0
    pub high: usize,
    /// 0.7..0.9
    pub medium_high: usize,
    /// 0.4..0.7
    pub medium: usize,
    /// 0.0..0.4
    pub low: usize,
}

impl ConfidenceDistribution {
    pub fn total(&self) -> usize {
        self.high + self.medium_high + self.medium + self.low
    }
}

/// Why a set of events ended a day without a real case link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonLinkageCause {
    /// `"role_aggregate_only"` or `"no_link"`.
    pub cause: String,
    pub event_count: usize,
    pub description: String,
}

/// An hourly block flagged for manual review because at least half of its
/// events are unlinked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyItem {
    /// UTC hour of day, 0..=23.
    pub hour: u32,
    pub total_events: usize,
    pub unlinked_events: usize,
    /// Rounded to 1 decimal place.
    pub unlinked_pct: f64,
    pub recommendation: String,
}

/// Point-in-time linkage quality report for one (engagement, UTC day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    /// ISO-8601 calendar date the report is scoped to.
    pub date: String,
    pub engagement_id: EngagementId,
    pub total_events: usize,
    /// Distinct events with a real (non-role-aggregate) link.
    pub linked_events: usize,
    /// Rounded to 2 decimal places; 0.0 when the day has zero events.
    pub linked_pct: f64,
    pub confidence_distribution: ConfidenceDistribution,
    pub non_linkage_causes: Vec<NonLinkageCause>,
    pub uncertainty_items: Vec<UncertaintyItem>,
}
