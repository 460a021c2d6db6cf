use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quote::{PriceField, Quote};
use super::types::SourceId;
use crate::registry::FetchDiagnostics;

/// What the caller wants to do with the foreign currency.
///
/// The intent decides the ranking direction, and by default which leg is
/// ranked.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderIntent {
    /// Acquire foreign currency as cheaply as possible (ascending).
    CheapestToBuy,
    /// Sell foreign currency for as much as possible (descending).
    BestToSell,
}

impl OrderIntent {
    /// The leg that prices this intent.
    pub fn default_leg(&self) -> PriceField {
        match self {
            Self::CheapestToBuy => PriceField::SellSpot,
            Self::BestToSell => PriceField::BuySpot,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Self::CheapestToBuy => Self::BestToSell,
            Self::BestToSell => Self::CheapestToBuy,
        }
    }
}

/// Parameters for one aggregation call.
#[derive(Clone, Debug)]
pub struct AggregateRequest {
    /// Free-form currency query ("usd", "港币", ...)
    pub currency: String,
    /// Source keys to query; `None` means every registered source
    pub sources: Option<Vec<String>>,
    /// Truncate the ranked list to this many entries.
    /// `Some(0)` is treated like `None`: every success is kept.
    pub top_n: Option<usize>,
    pub intent: OrderIntent,
    /// Leg to rank by; defaults to the intent's leg
    pub leg: Option<PriceField>,
}

impl AggregateRequest {
    pub fn new(currency: impl Into<String>, intent: OrderIntent) -> Self {
        Self {
            currency: currency.into(),
            sources: None,
            top_n: None,
            intent,
            leg: None,
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Keep only the best `top_n` entries; `0` keeps all of them.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_leg(mut self, leg: PriceField) -> Self {
        self.leg = Some(leg);
        self
    }

    /// The leg actually ranked.
    pub fn leg(&self) -> PriceField {
        self.leg.unwrap_or_else(|| self.intent.default_leg())
    }
}

/// A successful source together with the rate it is ranked by.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedQuote {
    /// Canonical (per-100) quote
    pub quote: Quote,
    /// Value of the ranked leg, per 100 foreign units
    pub rate: Decimal,
}

/// Outcome of a multi-source aggregation.
///
/// `ranked`, `timeouts` and `misses` are disjoint and together cover every
/// requested source exactly once (before `top_n` truncation of `ranked`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub ranked: Vec<RankedQuote>,
    pub timeouts: BTreeSet<SourceId>,
    pub misses: BTreeSet<SourceId>,
    /// Number of successful sources before truncation
    pub success_count: usize,
    #[serde(skip)]
    pub diagnostics: FetchDiagnostics,
}

impl AggregatedResult {
    /// True if no source produced a usable quote.
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Currency label taken from the first ranked quote.
    pub fn currency_name(&self) -> Option<String> {
        self.ranked.first().map(|r| r.quote.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_leg_follows_intent() {
        assert_eq!(OrderIntent::CheapestToBuy.default_leg(), PriceField::SellSpot);
        assert_eq!(OrderIntent::BestToSell.default_leg(), PriceField::BuySpot);
    }

    #[test]
    fn test_request_leg_override() {
        let request = AggregateRequest::new("usd", OrderIntent::CheapestToBuy);
        assert_eq!(request.leg(), PriceField::SellSpot);

        let request = request.with_leg(PriceField::SellCash);
        assert_eq!(request.leg(), PriceField::SellCash);
    }

    #[test]
    fn test_request_builder() {
        let request = AggregateRequest::new("hkd", OrderIntent::BestToSell)
            .with_sources(["boc", "cmb"])
            .with_top_n(3);
        assert_eq!(
            request.sources,
            Some(vec!["boc".to_string(), "cmb".to_string()])
        );
        assert_eq!(request.top_n, Some(3));
    }
}
