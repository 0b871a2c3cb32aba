//! TRACELINK Engine - Three-Pass Case Correlation
//!
//! Links canonical activity events to business cases in three strictly
//! sequential passes:
//!
//! 1. **Deterministic** - regex extraction of explicit case ids from
//!    window-title-like text (confidence 1.0).
//! 2. **Assisted** - probabilistic scoring of the residue against a feature
//!    index built from the deterministic links (time, role, system).
//! 3. **Role aggregate** - anything still unlinked is attributed to a
//!    synthetic per-role cohort so no work-time is lost from reporting.
//!
//! [`CorrelationPipeline`] enforces the pass order; [`CorrelationDiagnostics`]
//! produces the daily linkage quality report.

pub mod assisted;
pub mod deterministic;
pub mod diagnostics;
pub mod pattern;
pub mod pipeline;
pub mod role;

pub use assisted::{AssistedConfig, AssistedLinker, CaseFeatureIndex};
pub use deterministic::DeterministicLinker;
pub use diagnostics::CorrelationDiagnostics;
pub use pattern::PatternTable;
pub use pipeline::{CorrelationPipeline, PipelineConfig};
pub use role::RoleAssociator;
