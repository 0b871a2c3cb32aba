//! In-memory `CorrelationStore` backed by `RwLock`-guarded vectors.
//!
//! Insertion order is preserved per engagement so listings are deterministic.
//! Used by the test suites and by embedders that want a throwaway store.

use crate::{utc_day_bounds, CorrelationStore};
use ::async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::RwLock;
use tracelink_core::{
    CanonicalActivityEvent, CaseLinkEdge, EdgeFilter, EngagementId, EntityType, EventId,
    LinkMethod, MappingStatus, Page, StorageError, TracelinkResult,
};

/// In-memory storage for events and edges.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<Vec<CanonicalActivityEvent>>,
    edges: RwLock<Vec<CaseLinkEdge>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored event count across all engagements.
    pub fn event_count(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Total stored edge count across all engagements.
    pub fn edge_count(&self) -> usize {
        self.edges.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
        if let Ok(mut edges) = self.edges.write() {
            edges.clear();
        }
    }
}

#[async_trait]
impl CorrelationStore for MemoryStore {
    async fn event_insert(&self, event: &CanonicalActivityEvent) -> TracelinkResult<()> {
        let mut events = self.events.write().map_err(|_| StorageError::LockPoisoned)?;
        if events.iter().any(|e| e.event_id == event.event_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Event,
                reason: "already exists".to_string(),
            }
            .into());
        }
        events.push(event.clone());
        Ok(())
    }

    async fn event_list(
        &self,
        engagement_id: EngagementId,
    ) -> TracelinkResult<Vec<CanonicalActivityEvent>> {
        let events = self.events.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(events
            .iter()
            .filter(|e| e.engagement_id == engagement_id)
            .cloned()
            .collect())
    }

    async fn event_list_in_day(
        &self,
        engagement_id: EngagementId,
        day: NaiveDate,
    ) -> TracelinkResult<Vec<CanonicalActivityEvent>> {
        let (start, end) = utc_day_bounds(day);
        let events = self.events.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(events
            .iter()
            .filter(|e| e.engagement_id == engagement_id)
            .filter(|e| {
                e.timestamp_utc
                    .map(|ts| ts >= start && ts <= end)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn event_set_mapping_status(
        &self,
        event_id: EventId,
        status: MappingStatus,
    ) -> TracelinkResult<()> {
        let mut events = self.events.write().map_err(|_| StorageError::LockPoisoned)?;
        let event = events
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Event,
                id: event_id,
            })?;
        event.mapping_status = status;
        Ok(())
    }

    async fn unlinked_event_list(
        &self,
        engagement_id: EngagementId,
        page: Page,
    ) -> TracelinkResult<Vec<CanonicalActivityEvent>> {
        let linked_ids: HashSet<EventId> = {
            let edges = self.edges.read().map_err(|_| StorageError::LockPoisoned)?;
            edges
                .iter()
                .filter(|e| e.engagement_id == engagement_id && !e.is_role_aggregate())
                .map(|e| e.event_id)
                .collect()
        };
        let events = self.events.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(events
            .iter()
            .filter(|e| e.engagement_id == engagement_id)
            .filter(|e| !linked_ids.contains(&e.event_id))
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    async fn edge_insert(&self, edge: &CaseLinkEdge) -> TracelinkResult<()> {
        let mut edges = self.edges.write().map_err(|_| StorageError::LockPoisoned)?;
        if edges.iter().any(|e| e.edge_id == edge.edge_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Edge,
                reason: "already exists".to_string(),
            }
            .into());
        }
        edges.push(edge.clone());
        Ok(())
    }

    async fn edge_list(
        &self,
        engagement_id: EngagementId,
        method: Option<LinkMethod>,
    ) -> TracelinkResult<Vec<CaseLinkEdge>> {
        let edges = self.edges.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(edges
            .iter()
            .filter(|e| e.engagement_id == engagement_id)
            .filter(|e| method.map(|m| e.method == m).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn edge_list_filtered(
        &self,
        engagement_id: EngagementId,
        filter: &EdgeFilter,
        page: Page,
    ) -> TracelinkResult<Vec<CaseLinkEdge>> {
        let edges = self.edges.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(edges
            .iter()
            .filter(|e| e.engagement_id == engagement_id)
            .filter(|e| filter.matches(e))
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    async fn edge_delete_all(&self, engagement_id: EngagementId) -> TracelinkResult<usize> {
        let mut edges = self.edges.write().map_err(|_| StorageError::LockPoisoned)?;
        let before = edges.len();
        edges.retain(|e| e.engagement_id != engagement_id);
        Ok(before - edges.len())
    }
}
