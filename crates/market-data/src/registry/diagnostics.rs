//! Per-source outcome tracking for aggregation diagnostics.

use std::time::Duration;

use crate::models::{PriceField, SourceId};

/// Why a source that answered in time produced nothing usable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MissReason {
    /// The source does not list the currency.
    NotFound,

    /// A row matched but the ranked leg is unavailable or non-positive.
    NoUsableRate { leg: PriceField },

    /// Transport, status, decode or layout failure.
    Failed { message: String },
}

/// Classification of one source in one aggregation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceOutcome {
    Success,
    Timeout,
    Miss(MissReason),
}

/// Record of a single source attempt.
#[derive(Clone, Debug)]
pub struct SourceAttempt {
    pub source_id: SourceId,
    pub outcome: SourceOutcome,
    pub elapsed: Duration,
}

/// Every source outcome of one aggregation, in completion order.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<SourceAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_success(&mut self, source_id: SourceId, elapsed: Duration) {
        self.record(source_id, SourceOutcome::Success, elapsed);
    }

    pub fn record_timeout(&mut self, source_id: SourceId, elapsed: Duration) {
        self.record(source_id, SourceOutcome::Timeout, elapsed);
    }

    pub fn record_miss(&mut self, source_id: SourceId, reason: MissReason, elapsed: Duration) {
        self.record(source_id, SourceOutcome::Miss(reason), elapsed);
    }

    fn record(&mut self, source_id: SourceId, outcome: SourceOutcome, elapsed: Duration) {
        self.attempts.push(SourceAttempt {
            source_id,
            outcome,
            elapsed,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                let ms = a.elapsed.as_millis();
                match &a.outcome {
                    SourceOutcome::Success => format!("{}: SUCCESS ({}ms)", a.source_id, ms),
                    SourceOutcome::Timeout => format!("{}: TIMEOUT ({}ms)", a.source_id, ms),
                    SourceOutcome::Miss(MissReason::NotFound) => {
                        format!("{}: MISS (not listed, {}ms)", a.source_id, ms)
                    }
                    SourceOutcome::Miss(MissReason::NoUsableRate { leg }) => {
                        format!("{}: MISS (no {}, {}ms)", a.source_id, leg, ms)
                    }
                    SourceOutcome::Miss(MissReason::Failed { message }) => {
                        format!("{}: MISS ({}, {}ms)", a.source_id, message, ms)
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check if any source succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == SourceOutcome::Success)
    }

    /// Outcome recorded for a source, if any.
    pub fn outcome(&self, source_id: &str) -> Option<&SourceOutcome> {
        self.attempts
            .iter()
            .find(|a| a.source_id == source_id)
            .map(|a| &a.outcome)
    }

    /// Get all miss reasons.
    pub fn miss_reasons(&self) -> Vec<(&SourceId, &MissReason)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                SourceOutcome::Miss(reason) => Some((&a.source_id, reason)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_timeout(Cow::Borrowed("BOC"), Duration::from_secs(10));
        diag.record_miss(
            Cow::Borrowed("CITIC"),
            MissReason::NoUsableRate {
                leg: PriceField::SellCash,
            },
            Duration::from_millis(300),
        );
        diag.record_success(Cow::Borrowed("CMB"), Duration::from_millis(120));

        let summary = diag.summary();
        assert!(summary.contains("BOC: TIMEOUT (10000ms)"));
        assert!(summary.contains("CITIC: MISS (no sell cash"));
        assert!(summary.contains("CMB: SUCCESS (120ms)"));
    }

    #[test]
    fn test_has_success() {
        let mut diag = FetchDiagnostics::new();
        diag.record_miss(Cow::Borrowed("CGB"), MissReason::NotFound, Duration::ZERO);
        assert!(!diag.has_success());

        diag.record_success(Cow::Borrowed("CIB"), Duration::ZERO);
        assert!(diag.has_success());
    }

    #[test]
    fn test_outcome_lookup() {
        let mut diag = FetchDiagnostics::new();
        diag.record_miss(
            Cow::Borrowed("CGB"),
            MissReason::Failed {
                message: "Layout error".to_string(),
            },
            Duration::ZERO,
        );
        assert!(matches!(
            diag.outcome("CGB"),
            Some(SourceOutcome::Miss(MissReason::Failed { .. }))
        ));
        assert_eq!(diag.outcome("BOC"), None);
        assert_eq!(diag.miss_reasons().len(), 1);
    }
}
