//! Concurrent fan-out over the registered sources.
//!
//! One task per requested source, joined before classification. Each task
//! runs under its own deadline, `min(start + source_timeout, start +
//! aggregate_timeout)`, so one slow upstream cannot hold up the others and
//! no task outlives the call. Dropping the `aggregate` future drops the
//! `JoinSet`, which aborts every fetch still in flight.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};

use super::diagnostics::{FetchDiagnostics, MissReason};
use super::ranker::rank;
use super::SourceRegistry;
use crate::errors::{FailureClass, MarketDataError};
use crate::models::{AggregateRequest, AggregatedResult, RankedQuote, SourceId};
use crate::normalizer::normalize;

/// Fans a currency query out to many sources and ranks the answers.
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Query every requested source concurrently and rank the successes.
    ///
    /// Per-source failures never fail the call: each requested source ends
    /// up in exactly one of `ranked`, `timeouts` or `misses`. Only caller
    /// errors (empty query, unknown source key) are returned as `Err`.
    pub async fn aggregate(
        &self,
        request: &AggregateRequest,
    ) -> Result<AggregatedResult, MarketDataError> {
        let query = request.currency.trim().to_string();
        if query.is_empty() {
            return Err(MarketDataError::InvalidInput(
                "currency query is empty".to_string(),
            ));
        }
        let sources = self.registry.select(request.sources.as_deref())?;

        let config = self.registry.config();
        let start = Instant::now();
        let deadline = start + config.effective_source_timeout();
        let leg = request.leg();

        let mut pending: BTreeSet<SourceId> = BTreeSet::new();
        let mut tasks = JoinSet::new();
        for source in sources {
            let source_id: SourceId = Cow::Borrowed(source.id());
            pending.insert(source_id.clone());
            let query = query.clone();
            debug!("Dispatching '{}' to {}", query, source_id);
            tasks.spawn(async move {
                let outcome = timeout_at(deadline, source.fetch_quote(&query)).await;
                (source_id, start.elapsed(), outcome)
            });
        }

        let mut diagnostics = FetchDiagnostics::new();
        let mut successes: Vec<RankedQuote> = Vec::new();
        let mut timeouts: BTreeSet<SourceId> = BTreeSet::new();
        let mut misses: BTreeSet<SourceId> = BTreeSet::new();

        while let Some(joined) = tasks.join_next().await {
            let (source_id, elapsed, outcome) = match joined {
                Ok(finished) => finished,
                Err(e) => {
                    // Reconciled through `pending` below.
                    warn!("Source task ended abnormally: {}", e);
                    continue;
                }
            };
            pending.remove(&source_id);

            match outcome {
                Err(_) => {
                    debug!("{} timed out after {:?}", source_id, elapsed);
                    diagnostics.record_timeout(source_id.clone(), elapsed);
                    timeouts.insert(source_id);
                }
                Ok(Ok(Some(quote))) => {
                    let quote = normalize(quote);
                    match quote.price(leg) {
                        Some(rate) => {
                            diagnostics.record_success(source_id, elapsed);
                            successes.push(RankedQuote { quote, rate });
                        }
                        None => {
                            debug!("{} has no usable {}", source_id, leg);
                            diagnostics.record_miss(
                                source_id.clone(),
                                MissReason::NoUsableRate { leg },
                                elapsed,
                            );
                            misses.insert(source_id);
                        }
                    }
                }
                Ok(Ok(None)) => {
                    diagnostics.record_miss(source_id.clone(), MissReason::NotFound, elapsed);
                    misses.insert(source_id);
                }
                Ok(Err(e)) => {
                    warn!("{} failed for '{}': {}", source_id, query, e);
                    match e.failure_class() {
                        FailureClass::Timeout => {
                            diagnostics.record_timeout(source_id.clone(), elapsed);
                            timeouts.insert(source_id);
                        }
                        FailureClass::Miss => {
                            diagnostics.record_miss(
                                source_id.clone(),
                                MissReason::Failed {
                                    message: e.to_string(),
                                },
                                elapsed,
                            );
                            misses.insert(source_id);
                        }
                    }
                }
            }
        }

        for source_id in pending {
            diagnostics.record_miss(
                source_id.clone(),
                MissReason::Failed {
                    message: "task aborted".to_string(),
                },
                start.elapsed(),
            );
            misses.insert(source_id);
        }

        info!("Aggregated '{}': {}", query, diagnostics.summary());

        let success_count = successes.len();
        Ok(AggregatedResult {
            ranked: rank(successes, request.intent, request.top_n),
            timeouts,
            misses,
            success_count,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::models::{BaseUnit, OrderIntent, PriceField};
    use crate::provider::SourceAdapter;
    use crate::registry::testing::{quote, MockSource, Script};
    use crate::registry::SourceOutcome;
    use crate::resolver::CurrencyResolver;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn aggregator(sources: Vec<Arc<dyn SourceAdapter>>) -> Aggregator {
        aggregator_with(sources, FetchConfig::default())
    }

    fn aggregator_with(sources: Vec<Arc<dyn SourceAdapter>>, config: FetchConfig) -> Aggregator {
        Aggregator::new(Arc::new(SourceRegistry::new(
            sources,
            CurrencyResolver::default(),
            config,
        )))
    }

    fn answering(
        id: &'static str,
        key: &'static str,
        sell_spot: rust_decimal::Decimal,
    ) -> Arc<dyn SourceAdapter> {
        Arc::new(MockSource::new(
            id,
            key,
            Script::Answer(
                Duration::from_millis(100),
                quote(id, Some(sell_spot - dec!(5)), None, Some(sell_spot), None),
            ),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_success_one_timeout_one_miss() {
        let slow = quote("SLOW", Some(dec!(710)), None, Some(dec!(715)), None);
        let aggregator = aggregator(vec![
            answering("FAST", "fast", dec!(719.20)),
            Arc::new(MockSource::new(
                "SLOW",
                "slow",
                Script::Answer(Duration::from_secs(30), slow),
            )),
            Arc::new(MockSource::new("EMPTY", "empty", Script::NotListed)),
        ]);

        let result = aggregator
            .aggregate(&AggregateRequest::new("usd", OrderIntent::CheapestToBuy))
            .await
            .unwrap();

        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.timeouts.len(), 1);
        assert_eq!(result.misses.len(), 1);
        assert_eq!(result.success_count + result.timeouts.len() + result.misses.len(), 3);
        assert_eq!(result.ranked[0].quote.source, "FAST");
        assert!(result.timeouts.contains("SLOW"));
        assert!(result.misses.contains("EMPTY"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_does_not_block_others() {
        let slow = quote("SLOW", None, None, Some(dec!(715)), None);
        let aggregator = aggregator(vec![
            Arc::new(MockSource::new(
                "SLOW",
                "slow",
                Script::Answer(Duration::from_secs(3600), slow),
            )),
            answering("FAST", "fast", dec!(719.20)),
        ]);

        let started = Instant::now();
        let result = aggregator
            .aggregate(&AggregateRequest::new("usd", OrderIntent::CheapestToBuy))
            .await
            .unwrap();

        // Bounded by the per-source deadline, not by the slow source.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(11));
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(
            result.diagnostics.outcome("SLOW"),
            Some(&SourceOutcome::Timeout)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_deadline_never_exceeds_aggregate_deadline() {
        let config = FetchConfig::default()
            .with_source_timeout(Duration::from_secs(10))
            .with_aggregate_timeout(Duration::from_secs(2));
        let slowish = quote("SLOWISH", None, None, Some(dec!(715)), None);
        let aggregator = aggregator_with(
            vec![Arc::new(MockSource::new(
                "SLOWISH",
                "slowish",
                Script::Answer(Duration::from_secs(5), slowish),
            ))],
            config,
        );

        let started = Instant::now();
        let result = aggregator
            .aggregate(&AggregateRequest::new("usd", OrderIntent::CheapestToBuy))
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
        assert!(result.timeouts.contains("SLOWISH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ranking_and_top_n() {
        let aggregator = aggregator(vec![
            answering("A", "a", dec!(719.50)),
            answering("B", "b", dec!(718.90)),
            answering("C", "c", dec!(719.20)),
            Arc::new(MockSource::new("D", "d", Script::Broken)),
        ]);

        let request = AggregateRequest::new("usd", OrderIntent::CheapestToBuy).with_top_n(2);
        let result = aggregator.aggregate(&request).await.unwrap();

        let order: Vec<_> = result.ranked.iter().map(|r| r.quote.source.as_ref()).collect();
        assert_eq!(order, vec!["B", "C"]);
        assert_eq!(result.success_count, 3);
        assert!(result.misses.contains("D"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_leg_is_a_miss() {
        let no_sell = quote("NOSELL", Some(dec!(710)), None, None, None);
        let aggregator = aggregator(vec![Arc::new(MockSource::new(
            "NOSELL",
            "nosell",
            Script::Answer(Duration::ZERO, no_sell),
        ))]);

        let result = aggregator
            .aggregate(&AggregateRequest::new("usd", OrderIntent::CheapestToBuy))
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(result.misses.contains("NOSELL"));
        assert_eq!(
            result.diagnostics.outcome("NOSELL"),
            Some(&SourceOutcome::Miss(MissReason::NoUsableRate {
                leg: PriceField::SellSpot
            }))
        );

        // Same source, ranked by its buy leg instead.
        let request =
            AggregateRequest::new("usd", OrderIntent::CheapestToBuy).with_leg(PriceField::BuySpot);
        let result = aggregator.aggregate(&request).await.unwrap();
        assert_eq!(result.ranked[0].rate, dec!(710));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rates_are_normalized_before_ranking() {
        let mut per_unit = quote("UNIT", None, None, Some(dec!(7.10)), None);
        per_unit.base_unit = BaseUnit::One;
        let aggregator = aggregator(vec![
            Arc::new(MockSource::new(
                "UNIT",
                "unit",
                Script::Answer(Duration::ZERO, per_unit),
            )),
            answering("HUNDRED", "hundred", dec!(719.20)),
        ]);

        let result = aggregator
            .aggregate(&AggregateRequest::new("usd", OrderIntent::CheapestToBuy))
            .await
            .unwrap();
        assert_eq!(result.ranked[0].quote.source, "UNIT");
        assert_eq!(result.ranked[0].rate, dec!(710));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subset_and_duplicates() {
        let fast = MockSource::new(
            "FAST",
            "fast",
            Script::Answer(Duration::ZERO, quote("FAST", None, None, Some(dec!(719)), None)),
        );
        let fast = Arc::new(fast);
        let other = Arc::new(MockSource::new("OTHER", "other", Script::NotListed));
        let aggregator = aggregator(vec![fast.clone(), other.clone()]);

        let request = AggregateRequest::new("usd", OrderIntent::CheapestToBuy)
            .with_sources(["fast", "FAST"]);
        let result = aggregator.aggregate(&request).await.unwrap();

        assert_eq!(result.ranked.len(), 1);
        assert!(result.misses.is_empty());
        assert_eq!(fast.calls(), 1);
        assert_eq!(other.calls(), 0);
    }

    #[tokio::test]
    async fn test_caller_errors() {
        let aggregator = aggregator(vec![Arc::new(MockSource::new(
            "EMPTY",
            "empty",
            Script::NotListed,
        ))]);

        let request = AggregateRequest::new("usd", OrderIntent::BestToSell).with_sources(["nope"]);
        assert!(matches!(
            aggregator.aggregate(&request).await,
            Err(MarketDataError::UnknownSource(_))
        ));

        let request = AggregateRequest::new("  ", OrderIntent::BestToSell);
        assert!(matches!(
            aggregator.aggregate(&request).await,
            Err(MarketDataError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_not_an_error() {
        let aggregator = aggregator(vec![
            Arc::new(MockSource::new("X", "x", Script::Broken)),
            Arc::new(MockSource::new("Y", "y", Script::Broken)),
        ]);
        let result = aggregator
            .aggregate(&AggregateRequest::new("usd", OrderIntent::BestToSell))
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.misses.len(), 2);
        assert!(result.timeouts.is_empty());
    }
}
