//! TRACELINK Spine - Event Spine Builder
//!
//! Turns heterogeneous raw records into a deduplicated, chronologically
//! ordered canonical sequence. Any event producer runs this pipeline before
//! events are persisted; the correlation engine never re-runs it.

pub mod builder;

pub use builder::{EventSpineBuilder, SpineConfig, DEFAULT_DEDUP_TOLERANCE_SECS};
