//! TRACELINK Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the persistence abstraction the correlation engine runs against.
//! The engine only ever needs the operations below: select events for an
//! engagement (optionally within a day's UTC bounds), select/insert case-link
//! edges, and the listing queries served to collaborators. A relational
//! implementation lives outside this repository.

pub mod memory;

pub use memory::MemoryStore;

use ::async_trait::async_trait;
use chrono::NaiveDate;
use tracelink_core::{
    CanonicalActivityEvent, CaseLinkEdge, EdgeFilter, EngagementId, EventId, LinkMethod,
    MappingStatus, Page, Timestamp, TracelinkResult,
};

/// Inclusive UTC bounds of a calendar day: `00:00:00` through `23:59:59`.
pub fn utc_day_bounds(day: NaiveDate) -> (Timestamp, Timestamp) {
    let start = day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = day.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc();
    (start, end)
}

/// Async storage trait for correlation entities.
///
/// All queries are scoped to a single engagement; cross-engagement access is
/// intentionally not expressible. Edge writes are append-only except for
/// `edge_delete_all`, which exists so a rerun can start from a clean edge set.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    // ========================================================================
    // EVENT OPERATIONS
    // ========================================================================

    /// Insert a canonical event.
    async fn event_insert(&self, event: &CanonicalActivityEvent) -> TracelinkResult<()>;

    /// List all canonical events for an engagement, in insertion order.
    async fn event_list(
        &self,
        engagement_id: EngagementId,
    ) -> TracelinkResult<Vec<CanonicalActivityEvent>>;

    /// List events whose timestamp falls within the UTC bounds of `day`.
    /// Events with no timestamp are never returned here.
    async fn event_list_in_day(
        &self,
        engagement_id: EngagementId,
        day: NaiveDate,
    ) -> TracelinkResult<Vec<CanonicalActivityEvent>>;

    /// Flip an event's mapping-status flag. The only mutation events admit
    /// after canonicalization.
    async fn event_set_mapping_status(
        &self,
        event_id: EventId,
        status: MappingStatus,
    ) -> TracelinkResult<()>;

    /// List events with no real (non-role-aggregate) link, paged.
    async fn unlinked_event_list(
        &self,
        engagement_id: EngagementId,
        page: Page,
    ) -> TracelinkResult<Vec<CanonicalActivityEvent>>;

    // ========================================================================
    // EDGE OPERATIONS
    // ========================================================================

    /// Insert a case-link edge.
    async fn edge_insert(&self, edge: &CaseLinkEdge) -> TracelinkResult<()>;

    /// List edges for an engagement, optionally restricted to one method.
    async fn edge_list(
        &self,
        engagement_id: EngagementId,
        method: Option<LinkMethod>,
    ) -> TracelinkResult<Vec<CaseLinkEdge>>;

    /// List edges matching a filter, paged.
    async fn edge_list_filtered(
        &self,
        engagement_id: EngagementId,
        filter: &EdgeFilter,
        page: Page,
    ) -> TracelinkResult<Vec<CaseLinkEdge>>;

    /// Delete every edge for an engagement, returning the number removed.
    /// Used by the pipeline's clear-before-rerun contract.
    async fn edge_delete_all(&self, engagement_id: EngagementId) -> TracelinkResult<usize>;
}
