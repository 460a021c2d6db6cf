//! Source registry and aggregation.
//!
//! This module provides orchestration over the quote sources, including:
//! - Source registration and lookup by key or id
//! - Concurrent fan-out with per-source deadlines
//! - Ranking of successful quotes by caller intent
//! - Per-source outcome diagnostics

mod aggregator;
mod diagnostics;
mod ranker;
mod source_registry;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::Aggregator;
pub use diagnostics::{FetchDiagnostics, MissReason, SourceAttempt, SourceOutcome};
pub use ranker::rank;
pub use source_registry::SourceRegistry;
