//! Registry of quote sources.
//!
//! Looks sources up by user key or id and runs single-source lookups. The
//! registry is immutable once built and is shared behind an `Arc` by the
//! aggregator and the converter.

use std::sync::Arc;

use log::debug;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::normalizer::normalize;
use crate::provider::{
    BocSource, CgbSource, CibSource, CiticSource, CmbSource, SourceAdapter, UnionPaySource,
};
use crate::resolver::CurrencyResolver;

/// Registered sources plus the shared resolver and fetch settings.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SourceAdapter>>,
    resolver: CurrencyResolver,
    config: FetchConfig,
}

impl SourceRegistry {
    /// Create a registry over an explicit source list.
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        resolver: CurrencyResolver,
        config: FetchConfig,
    ) -> Self {
        Self {
            sources,
            resolver,
            config,
        }
    }

    /// Create a registry with every bundled source.
    pub fn with_default_sources(config: FetchConfig) -> Self {
        let resolver = CurrencyResolver::default();
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(BocSource::new(&config, resolver.clone())),
            Arc::new(CibSource::new(&config, resolver.clone())),
            Arc::new(CgbSource::new(&config, resolver.clone())),
            Arc::new(CiticSource::new(&config, resolver.clone())),
            Arc::new(CmbSource::new(&config, resolver.clone())),
            Arc::new(UnionPaySource::new(&config, resolver.clone())),
        ];
        Self::new(sources, resolver, config)
    }

    pub fn sources(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.sources
    }

    pub fn resolver(&self) -> &CurrencyResolver {
        &self.resolver
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// User keys of every registered source, in registration order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.key()).collect()
    }

    /// Look a source up by key ("boc") or id ("BOC"), case-insensitively.
    pub fn get(&self, name: &str) -> Result<Arc<dyn SourceAdapter>, MarketDataError> {
        let name = name.trim();
        self.sources
            .iter()
            .find(|s| s.key().eq_ignore_ascii_case(name) || s.id().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| MarketDataError::UnknownSource(name.to_string()))
    }

    /// Resolve a requested subset; `None` selects every source.
    ///
    /// Duplicates collapse to one entry so each source is fetched once.
    pub fn select(
        &self,
        names: Option<&[String]>,
    ) -> Result<Vec<Arc<dyn SourceAdapter>>, MarketDataError> {
        let Some(names) = names else {
            return Ok(self.sources.clone());
        };

        let mut selected: Vec<Arc<dyn SourceAdapter>> = Vec::with_capacity(names.len());
        for name in names {
            let source = self.get(name)?;
            if !selected.iter().any(|s| s.id() == source.id()) {
                selected.push(source);
            }
        }
        Ok(selected)
    }

    /// Fetch one source's canonical quote.
    ///
    /// Bounded by the per-source timeout. Errors propagate to the caller;
    /// `Ok(None)` means the source does not list the currency.
    pub async fn fetch_quote(
        &self,
        source: &str,
        query: &str,
    ) -> Result<Option<Quote>, MarketDataError> {
        let source = self.get(source)?;
        debug!("Single-source lookup of '{}' from {}", query, source.id());

        match tokio::time::timeout(self.config.source_timeout, source.fetch_quote(query)).await {
            Ok(result) => Ok(result?.map(normalize)),
            Err(_) => Err(MarketDataError::Timeout {
                source_id: source.id().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaseUnit;
    use crate::registry::testing::{quote, MockSource, Script};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn registry(sources: Vec<Arc<dyn SourceAdapter>>) -> SourceRegistry {
        SourceRegistry::new(sources, CurrencyResolver::default(), FetchConfig::default())
    }

    #[test]
    fn test_default_sources() {
        let registry = SourceRegistry::with_default_sources(FetchConfig::default());
        assert_eq!(
            registry.keys(),
            vec!["boc", "cib", "cgb", "citic", "cmb", "unionpay"]
        );
    }

    #[test]
    fn test_get_by_key_or_id() {
        let registry = SourceRegistry::with_default_sources(FetchConfig::default());
        assert_eq!(registry.get("cmb").unwrap().id(), "CMB");
        assert_eq!(registry.get(" UNIONPAY ").unwrap().key(), "unionpay");
        assert!(matches!(
            registry.get("hsbc"),
            Err(MarketDataError::UnknownSource(name)) if name == "hsbc"
        ));
    }

    #[test]
    fn test_select_dedups() {
        let registry = SourceRegistry::with_default_sources(FetchConfig::default());
        let names = vec!["boc".to_string(), "BOC".to_string(), "cib".to_string()];
        let selected = registry.select(Some(&names)).unwrap();
        let ids: Vec<_> = selected.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["BOC", "CIB"]);

        assert_eq!(registry.select(None).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_quote_is_normalized() {
        let mut raw = quote("MOCK", Some(dec!(7.1)), None, Some(dec!(7.2)), None);
        raw.base_unit = BaseUnit::One;
        let registry = registry(vec![Arc::new(MockSource::new(
            "MOCK",
            "mock",
            Script::Answer(Duration::ZERO, raw),
        ))]);

        let quote = registry.fetch_quote("mock", "usd").await.unwrap().unwrap();
        assert_eq!(quote.buy_spot, Some(dec!(710)));
        assert_eq!(quote.sell_spot, Some(dec!(720)));
        assert_eq!(quote.base_unit, BaseUnit::Hundred);
    }

    #[tokio::test]
    async fn test_fetch_quote_propagates_errors() {
        let registry = registry(vec![Arc::new(MockSource::new(
            "MOCK",
            "mock",
            Script::Broken,
        ))]);
        assert!(matches!(
            registry.fetch_quote("mock", "usd").await,
            Err(MarketDataError::Layout { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_quote_times_out() {
        let slow = quote("SLOW", Some(dec!(710)), None, None, None);
        let registry = registry(vec![Arc::new(MockSource::new(
            "SLOW",
            "slow",
            Script::Answer(Duration::from_secs(60), slow),
        ))]);
        assert!(matches!(
            registry.fetch_quote("slow", "usd").await,
            Err(MarketDataError::Timeout { source_id }) if source_id == "SLOW"
        ));
    }
}
