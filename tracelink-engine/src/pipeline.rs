//! Correlation pipeline: deterministic -> assisted -> role-aggregate.
//!
//! The three passes are strictly sequential because each pass's precondition
//! is "events not yet linked by an earlier pass", and the assisted pass feeds
//! on the deterministic pass's output. The pipeline type owns that ordering
//! so call sites cannot get it wrong.

use crate::assisted::{AssistedConfig, AssistedLinker, CaseFeatureIndex};
use crate::deterministic::DeterministicLinker;
use crate::role::RoleAssociator;
use std::collections::HashSet;
use tracelink_core::{CorrelationRunSummary, EngagementId, EventId, LinkMethod, TracelinkResult};
use tracelink_storage::CorrelationStore;

/// Pipeline tunables.
///
/// `clear_edges_before_run` makes reruns idempotent by deleting the
/// engagement's existing edges first. Turning it off reproduces the
/// append-only behavior where a rerun can create duplicate or conflicting
/// edges; callers doing so own that risk.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub clear_edges_before_run: bool,
    pub assisted: AssistedConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clear_edges_before_run: true,
            assisted: AssistedConfig::default(),
        }
    }
}

/// One-shot correlation run over an engagement's full event set.
///
/// Concurrent runs for different engagements are safe (disjoint scope);
/// runs for the same engagement must be serialized by the caller.
pub struct CorrelationPipeline<'a, S: CorrelationStore> {
    store: &'a S,
    deterministic: DeterministicLinker,
    assisted: AssistedLinker,
    role: RoleAssociator,
    config: PipelineConfig,
}

impl<'a, S: CorrelationStore> CorrelationPipeline<'a, S> {
    pub fn new(store: &'a S, config: PipelineConfig) -> Self {
        Self {
            store,
            deterministic: DeterministicLinker::new(),
            assisted: AssistedLinker::new(config.assisted),
            role: RoleAssociator::new(),
            config,
        }
    }

    /// Replace the default deterministic linker (custom pattern table).
    pub fn with_deterministic(mut self, linker: DeterministicLinker) -> Self {
        self.deterministic = linker;
        self
    }

    /// Execute one full correlation run and return its summary.
    ///
    /// Zero events is not an error: the summary comes back all-zero.
    /// Persistence failures propagate unchanged; whatever edges completed
    /// passes committed remain valid.
    pub async fn run(
        &self,
        engagement_id: EngagementId,
    ) -> TracelinkResult<CorrelationRunSummary> {
        if self.config.clear_edges_before_run {
            let removed = self.store.edge_delete_all(engagement_id).await?;
            if removed > 0 {
                tracing::info!(
                    engagement_id = %engagement_id,
                    removed,
                    "cleared stale edges before rerun"
                );
            }
        }

        let all_events = self.store.event_list(engagement_id).await?;
        if all_events.is_empty() {
            return Ok(CorrelationRunSummary::empty(engagement_id));
        }

        // -- Deterministic pass --
        let det_edges = self.deterministic.link_events(&all_events);
        for edge in &det_edges {
            self.store.edge_insert(edge).await?;
        }
        let deterministic_count = det_edges.len();

        let mut linked_ids: HashSet<EventId> = det_edges.iter().map(|e| e.event_id).collect();
        let unlinked_after_det: Vec<_> = all_events
            .iter()
            .filter(|e| !linked_ids.contains(&e.event_id))
            .cloned()
            .collect();

        // -- Assisted pass: feature index from persisted deterministic edges --
        let known_det_edges = self
            .store
            .edge_list(engagement_id, Some(LinkMethod::Deterministic))
            .await?;
        let index = CaseFeatureIndex::from_edges(&known_det_edges, &all_events);
        let assisted_edges = self.assisted.link(&unlinked_after_det, &index);
        for edge in &assisted_edges {
            self.store.edge_insert(edge).await?;
        }
        let assisted_count = assisted_edges.len();
        linked_ids.extend(assisted_edges.iter().map(|e| e.event_id));

        // -- Role-aggregate pass: events with no edge at all --
        let edged_ids: HashSet<EventId> = self
            .store
            .edge_list(engagement_id, None)
            .await?
            .iter()
            .map(|e| e.event_id)
            .collect();
        let still_unlinked: Vec<_> = all_events
            .iter()
            .filter(|e| !edged_ids.contains(&e.event_id))
            .cloned()
            .collect();
        let role_edges = self.role.associate(&still_unlinked);
        for edge in &role_edges {
            self.store.edge_insert(edge).await?;
        }
        let role_aggregate_count = role_edges.len();

        let links_created = deterministic_count + assisted_count + role_aggregate_count;
        let unlinked_count = all_events.len().saturating_sub(links_created);

        let summary = CorrelationRunSummary {
            engagement_id,
            total_events: all_events.len(),
            deterministic_count,
            assisted_count,
            role_aggregate_count,
            unlinked_count,
            links_created,
        };

        tracing::info!(
            engagement_id = %engagement_id,
            deterministic = deterministic_count,
            assisted = assisted_count,
            role_aggregate = role_aggregate_count,
            unlinked = unlinked_count,
            "correlation run complete"
        );

        Ok(summary)
    }
}

// =============================================================================
// TESTS
// =============================================================================
